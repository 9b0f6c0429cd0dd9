use axum::extract::State;

use crate::api::extractors::AppJson;
use crate::api::v1::dto::{TranslateRequest, TranslateResponse};
use crate::api::v1::response::{ApiError, ApiResponse};
use crate::api::AppState;

/// `POST /api/v1/translations`
///
/// Translates `text` from `source` into every distinct target other than the
/// source. When only the source remains the text is echoed back without a
/// generator call.
#[utoipa::path(
    post,
    path = "/api/v1/translations",
    tag = "translations",
    operation_id = "translations.create",
    request_body = TranslateRequest,
    responses(
        (status = 200, description = "Translations keyed by language code", body = TranslateResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 502, description = "Generator reply could not be recovered", body = ApiError),
    )
)]
pub async fn translate(
    State(state): State<AppState>,
    AppJson(req): AppJson<TranslateRequest>,
) -> ApiResponse<TranslateResponse> {
    match state.translation.translate(&req.into()).await {
        Ok(translations) => ApiResponse::success(TranslateResponse { translations }),
        Err(e) => e.into(),
    }
}
