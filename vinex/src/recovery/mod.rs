//! Structured-response recovery
//!
//! Turns the free-form text a generator returns into a validated JSON record:
//!
//! 1. strip fenced code-block markers,
//! 2. cut the span between the first `{` and the last `}`,
//! 3. parse it,
//! 4. validate and repair it against an [`ExtractionSchema`].
//!
//! Every failure keeps the original text so the only evidence of what the
//! upstream model said is never lost. Recovery is pure and never retries the
//! generator; that decision belongs to the caller.

mod json;
mod schema;
pub mod schemas;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

pub use json::{locate_object, strip_code_fences};
pub use schema::{ExtractionSchema, FieldSpec, Node};
pub use schemas::SchemaRegistry;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecoveryError {
    #[error("no JSON object found in model response")]
    NoJsonFound { raw: String },

    #[error("model response is not valid JSON: {reason}")]
    MalformedJson { raw: String, reason: String },

    #[error("model response is missing required fields: {}", missing.join(", "))]
    SchemaViolation { raw: String, missing: Vec<String> },
}

impl RecoveryError {
    /// The untouched generator output this error was raised for.
    pub fn raw_text(&self) -> &str {
        match self {
            Self::NoJsonFound { raw }
            | Self::MalformedJson { raw, .. }
            | Self::SchemaViolation { raw, .. } => raw,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoJsonFound { .. } => "no_json_found",
            Self::MalformedJson { .. } => "malformed_json",
            Self::SchemaViolation { .. } => "schema_violation",
        }
    }
}

/// A validated record paired with the raw text it was recovered from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedRecord {
    value: Value,
    raw_text: String,
}

impl ExtractedRecord {
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Top-level object fields. Every built-in schema root recovers to an object.
    pub fn fields(&self) -> Option<&Map<String, Value>> {
        self.value.as_object()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.value.get(key)
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn into_parts(self) -> (Value, String) {
        (self.value, self.raw_text)
    }

    /// Deserialize the validated value into a typed record.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.value)
    }
}

/// Recover a schema-conforming record from raw generator output.
pub fn recover(raw: &str, schema: &ExtractionSchema) -> Result<ExtractedRecord, RecoveryError> {
    let cleaned = strip_code_fences(raw);

    let Some(candidate) = locate_object(&cleaned) else {
        tracing::debug!(
            schema = %schema.name,
            response_len = raw.len(),
            "No JSON object in model response"
        );
        return Err(RecoveryError::NoJsonFound {
            raw: raw.to_string(),
        });
    };

    let parsed: Value =
        serde_json::from_str(candidate).map_err(|e| RecoveryError::MalformedJson {
            raw: raw.to_string(),
            reason: e.to_string(),
        })?;

    let value = schema
        .validate(parsed)
        .map_err(|missing| RecoveryError::SchemaViolation {
            raw: raw.to_string(),
            missing,
        })?;

    Ok(ExtractedRecord {
        value,
        raw_text: raw.to_string(),
    })
}
