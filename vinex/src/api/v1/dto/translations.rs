//! Translation DTOs for the v1 API.

use serde::{Deserialize, Serialize};

use crate::models::{TranslationRequest, Translations};

/// Request body for `POST /v1/translations`.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TranslateRequest {
    /// Language code of `text`: one of `ru`, `en`, `uz`, `kz`, `ko`.
    pub source: String,
    /// Text to translate.
    pub text: String,
    /// Language codes to translate into. The source code is ignored.
    #[serde(default)]
    pub targets: Vec<String>,
}

impl From<TranslateRequest> for TranslationRequest {
    fn from(req: TranslateRequest) -> Self {
        Self {
            source: req.source,
            text: req.text,
            targets: req.targets,
        }
    }
}

/// Response body for `POST /v1/translations`.
///
/// Keys of `translations` are language codes; a target the generator omitted
/// is present with an empty string.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TranslateResponse {
    #[schema(value_type = Object)]
    pub translations: Translations,
}
