use axum::extract::State;
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::v1::response::ApiResponse;
use crate::config::{parse_llm_provider_model, ModelOutput};

/// Health data returned inside the v1 envelope.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub model: ModelStatus,
    pub llm: LlmStatus,
    pub storage: StorageStatus,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ModelStatus {
    pub status: String,
    /// `onnx` or `native`.
    pub backend: String,
    /// `denoised` or `residual`.
    pub output: String,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct LlmStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct StorageStatus {
    pub backend: String,
}

/// `GET /api/v1/health`
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "health",
    responses(
        (status = 200, description = "Service health status", body = HealthData),
    )
)]
pub async fn health_check(State(state): State<AppState>) -> ApiResponse<HealthData> {
    let model_status = ModelStatus {
        status: "loaded".to_string(),
        backend: state.engine.backend_name().to_string(),
        output: match state.engine.output() {
            ModelOutput::Denoised => "denoised",
            ModelOutput::Residual => "residual",
        }
        .to_string(),
    };

    let llm_status = match state.config.llm.as_ref() {
        Some(cfg) if state.generator.is_available() => {
            let (provider, name) = parse_llm_provider_model(&cfg.model);
            let provider = match (provider, &cfg.base_url) {
                ("local", Some(_)) => "openai-compatible".to_string(),
                (provider, _) => provider.to_lowercase(),
            };
            LlmStatus {
                status: "available".to_string(),
                provider: Some(provider),
                model: Some(name.to_string()),
            }
        }
        _ => LlmStatus {
            status: "unavailable".to_string(),
            provider: None,
            model: None,
        },
    };

    ApiResponse::success(HealthData {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model: model_status,
        llm: llm_status,
        storage: StorageStatus {
            backend: state.store.backend().to_string(),
        },
    })
}
