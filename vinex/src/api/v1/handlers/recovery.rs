use axum::extract::State;

use crate::api::extractors::AppJson;
use crate::api::v1::dto::{ListSchemasResponse, RecoverRequest, RecoverResponse};
use crate::api::v1::response::{ApiError, ApiResponse, ErrorCode};
use crate::api::AppState;
use crate::error::VinexError;
use crate::recovery::recover;

/// `POST /api/v1/responses:recover`
///
/// Runs a raw generator reply through recovery against a registered schema.
#[utoipa::path(
    post,
    path = "/api/v1/responses:recover",
    tag = "recovery",
    operation_id = "responses.recover",
    request_body = RecoverRequest,
    responses(
        (status = 200, description = "Validated record", body = RecoverResponse),
        (status = 404, description = "Unknown schema", body = ApiError),
        (status = 502, description = "Reply could not be recovered", body = ApiError),
    )
)]
pub async fn recover_response(
    State(state): State<AppState>,
    AppJson(req): AppJson<RecoverRequest>,
) -> ApiResponse<RecoverResponse> {
    let Some(schema) = state.schemas.get(&req.schema) else {
        return ApiResponse::error(
            ErrorCode::NotFound,
            format!("Unknown schema '{}'", req.schema),
        );
    };

    match recover(&req.text, schema) {
        Ok(record) => ApiResponse::success(RecoverResponse {
            schema: req.schema,
            record: record.into_parts().0,
        }),
        Err(e) => VinexError::from(e).into(),
    }
}

/// `GET /api/v1/schemas`
#[utoipa::path(
    get,
    path = "/api/v1/schemas",
    tag = "recovery",
    operation_id = "schemas.list",
    responses(
        (status = 200, description = "Registered extraction schemas", body = ListSchemasResponse),
    )
)]
pub async fn list_schemas(State(state): State<AppState>) -> ApiResponse<ListSchemasResponse> {
    ApiResponse::success(ListSchemasResponse {
        schemas: state.schemas.names().map(str::to_string).collect(),
    })
}
