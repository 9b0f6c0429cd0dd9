use thiserror::Error;

use crate::recovery::RecoveryError;

#[derive(Error, Debug)]
pub enum VinexError {
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Model load error: {0}")]
    ModelLoad(String),

    #[error("Inference shape error: {0}")]
    InferenceShape(String),

    #[error(transparent)]
    Recovery(#[from] RecoveryError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("LLM unavailable: {0}")]
    LlmUnavailable(String),

    #[error("LLM rate limit exceeded, retry after {retry_after:?} seconds")]
    LlmRateLimit { retry_after: Option<u64> },
}

pub type Result<T> = std::result::Result<T, VinexError>;
