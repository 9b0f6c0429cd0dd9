//! Consignee generation DTOs for the v1 API.

use serde::{Deserialize, Serialize};

use crate::models::{ConsigneeRecord, Country};

/// Request body for `POST /v1/consignees:generate`.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateConsigneeRequest {
    /// One of `Russia`, `Kazakhstan`, `Kyrgyzstan`, `Uzbekistan`.
    pub country: String,
}

/// Response body for `POST /v1/consignees:generate`.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateConsigneeResponse {
    pub country: Country,
    pub data: ConsigneeRecord,
}
