//! Response recovery DTOs for the v1 API.
//!
//! Lets operators replay a stored raw generator reply through the same
//! recovery path the live endpoints use.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request body for `POST /v1/responses:recover`.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecoverRequest {
    /// Name of a registered extraction schema, e.g. `vin_fields`.
    pub schema: String,
    /// Raw generator reply.
    pub text: String,
}

/// Response body for `POST /v1/responses:recover`.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecoverResponse {
    pub schema: String,
    /// The validated record with optional fields filled in.
    #[schema(value_type = Object)]
    pub record: Value,
}

/// Response body for `GET /v1/schemas`.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListSchemasResponse {
    pub schemas: Vec<String>,
}
