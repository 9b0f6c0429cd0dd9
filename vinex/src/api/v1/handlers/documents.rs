//! v1 document extraction handler.
//!
//! `POST /api/v1/documents:extract` takes a multipart upload with a `file`
//! field, enhances it, and reads the registration fields from the result.

use axum::extract::{Multipart, State};

use crate::api::v1::dto::ExtractDocumentResponse;
use crate::api::v1::response::{ApiError, ApiResponse, ErrorCode};
use crate::api::AppState;

const DEFAULT_FILENAME: &str = "upload.png";

/// Last path segment of a client-supplied filename.
fn base_name(filename: &str) -> &str {
    filename
        .rsplit(['/', '\\'])
        .next()
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .unwrap_or(DEFAULT_FILENAME)
}

/// `POST /api/v1/documents:extract`
#[utoipa::path(
    post,
    path = "/api/v1/documents:extract",
    tag = "documents",
    operation_id = "documents.extract",
    request_body(content_type = "multipart/form-data", content = String, description = "Document image in the `file` field"),
    responses(
        (status = 200, description = "Extracted registration fields", body = ExtractDocumentResponse),
        (status = 400, description = "Missing, corrupt or undersized image", body = ApiError),
        (status = 501, description = "No generator configured", body = ApiError),
        (status = 502, description = "Generator reply could not be recovered", body = ApiError),
    )
)]
pub async fn extract_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResponse<ExtractDocumentResponse> {
    let mut upload = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return ApiResponse::error(
                    ErrorCode::InvalidRequest,
                    format!("Invalid multipart body: {}", e.body_text()),
                );
            }
        };
        if field.name() != Some("file") {
            continue;
        }

        let filename = base_name(field.file_name().unwrap_or(DEFAULT_FILENAME)).to_string();
        match field.bytes().await {
            Ok(bytes) => upload = Some((filename, bytes)),
            Err(e) => {
                return ApiResponse::error(
                    ErrorCode::InvalidRequest,
                    format!("Failed to read file: {}", e.body_text()),
                );
            }
        }
    }

    let Some((filename, bytes)) = upload else {
        return ApiResponse::error(ErrorCode::InvalidRequest, "Missing 'file' field");
    };
    if bytes.is_empty() {
        return ApiResponse::error(ErrorCode::InvalidRequest, "Uploaded file is empty");
    }

    tracing::info!(filename = %filename, size = bytes.len(), "Extracting document");
    match state.extraction.extract(&filename, &bytes).await {
        Ok(result) => ApiResponse::success(result.into()),
        Err(e) => e.into(),
    }
}
