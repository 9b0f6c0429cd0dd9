//! Document extraction DTOs for the v1 API.

use serde::{Deserialize, Serialize};

use crate::models::{ExtractionResult, VinFields};

/// Response body for `POST /v1/documents:extract`.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExtractDocumentResponse {
    /// Name of the uploaded file.
    pub filename: String,
    /// URL of the enhanced image handed to the generator. A `data:` URL when
    /// the inline storage backend is configured.
    pub image_url: String,
    /// Registration fields read from the enhanced image. Unreadable fields
    /// are `null`.
    pub fields: VinFields,
    /// The generator's reply exactly as received.
    pub raw_response: String,
}

impl From<ExtractionResult> for ExtractDocumentResponse {
    fn from(result: ExtractionResult) -> Self {
        Self {
            filename: result.filename,
            image_url: result.image_url,
            fields: result.fields,
            raw_response: result.raw_response,
        }
    }
}
