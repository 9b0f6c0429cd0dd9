mod consignee;
mod translation;
mod vin;

pub use consignee::*;
pub use translation::*;
pub use vin::*;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Generators return numbers and strings interchangeably for the same field.
/// Accept any scalar as text; blank strings read as absent.
pub(crate) fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        Some(other) => Some(other.to_string()),
    })
}
