use serde_json::{Map, Value};

/// Translated texts keyed by language code, in canonical code order.
pub type Translations = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    pub source: String,
    pub text: String,
    pub targets: Vec<String>,
}
