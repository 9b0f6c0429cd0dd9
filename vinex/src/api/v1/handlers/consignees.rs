use axum::extract::State;

use crate::api::extractors::AppJson;
use crate::api::v1::dto::{GenerateConsigneeRequest, GenerateConsigneeResponse};
use crate::api::v1::response::{ApiError, ApiResponse, ErrorCode};
use crate::api::AppState;
use crate::models::Country;

/// `POST /api/v1/consignees:generate`
#[utoipa::path(
    post,
    path = "/api/v1/consignees:generate",
    tag = "consignees",
    operation_id = "consignees.generate",
    request_body = GenerateConsigneeRequest,
    responses(
        (status = 200, description = "Synthetic consignee record", body = GenerateConsigneeResponse),
        (status = 400, description = "Unknown country", body = ApiError),
        (status = 502, description = "Generator reply could not be recovered", body = ApiError),
    )
)]
pub async fn generate_consignee(
    State(state): State<AppState>,
    AppJson(req): AppJson<GenerateConsigneeRequest>,
) -> ApiResponse<GenerateConsigneeResponse> {
    let country: Country = match req.country.parse() {
        Ok(country) => country,
        Err(message) => return ApiResponse::error(ErrorCode::InvalidRequest, message),
    };

    match state.consignee.generate(country).await {
        Ok(data) => ApiResponse::success(GenerateConsigneeResponse { country, data }),
        Err(e) => e.into(),
    }
}
