use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::lenient_text;

/// Fields read off a vehicle registration or inspection document.
///
/// Every field is optional: a document that shows no weight still yields a
/// usable record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct VinFields {
    #[serde(default, deserialize_with = "lenient_text")]
    pub vin: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub car_model: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub manufacturer: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub engine_cc: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub weight: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub manufacture_date: Option<String>,
}

impl VinFields {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Outcome of the document extraction flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    pub filename: String,
    /// Where the enhanced image was published for the generator.
    pub image_url: String,
    pub fields: VinFields,
    pub raw_response: String,
}
