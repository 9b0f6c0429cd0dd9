use serde::Deserialize;
use std::env;

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

fn parse_env_opt<T: std::str::FromStr>(var: &str) -> Option<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Ignoring.", val, var, e);
                None
            }
        },
        Err(_) => None,
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub enhancement: EnhancementConfig,
    pub model: ModelConfig,
    pub storage: StorageConfig,
    pub recovery: RecoveryConfig,
    pub llm: Option<LlmConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub api_keys: Vec<String>,
    /// Upper bound for uploaded document size in bytes.
    pub max_upload_bytes: usize,
}

/// Tunables for the enhancement pipeline that are allowed to vary per
/// deployment. Exposure thresholds and CLAHE parameters are fixed constants
/// and live next to the code that applies them.
#[derive(Debug, Clone, Deserialize)]
pub struct EnhancementConfig {
    /// Images whose larger side exceeds this are area-downscaled before
    /// enhancement. `0` disables downscaling.
    pub max_image_dimension: u32,
    pub min_image_dimension: u32,
}

/// What the denoising graph's output tensor holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelOutput {
    /// The clean image; the graph subtracts its residual itself.
    Denoised,
    /// The predicted noise, subtracted from the input by the engine.
    Residual,
}

impl std::str::FromStr for ModelOutput {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "denoised" => Ok(Self::Denoised),
            "residual" => Ok(Self::Residual),
            other => Err(format!("unknown model output '{other}'")),
        }
    }
}

/// Location of the frozen denoising network.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Filesystem path or `http(s)://` URL of an ONNX model.
    pub weights: String,
    /// Expected SHA-256 (hex) of the artifact. Checked when present.
    pub sha256: Option<String>,
    /// Directory used to cache downloaded weights.
    pub cache_dir: String,
    pub download_timeout_secs: u64,
    pub output: ModelOutput,
    /// Intra-op threads for the ONNX session. `0` keeps the runtime default.
    pub threads: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Images travel to the generator as base64 `data:` URLs.
    Inline,
    /// Images are written under `local_dir` and served from `public_base_url`.
    Local,
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "inline" => Ok(Self::Inline),
            "local" => Ok(Self::Local),
            other => Err(format!("unknown storage backend '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub local_dir: String,
    pub public_base_url: String,
    pub folder: String,
    /// Local objects older than this are swept. `0` keeps them forever.
    pub retention_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecoveryConfig {
    /// Optional directory of additional `*.json` extraction schemas.
    pub schema_dir: Option<String>,
}

/// LLM configuration for the vision/text generator
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
    /// Model used for translation prompts; falls back to `model`.
    pub translation_model: Option<String>,
}

impl Default for EnhancementConfig {
    fn default() -> Self {
        Self {
            max_image_dimension: 1600,
            min_image_dimension: 16,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Inline,
            local_dir: "uploads".to_string(),
            public_base_url: "http://localhost:3000/files".to_string(),
            folder: "vin-temp".to_string(),
            retention_secs: 3600,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let storage_defaults = StorageConfig::default();
        Self {
            server: ServerConfig {
                host: env::var("VINEX_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or("VINEX_PORT", 3000),
                api_keys: env::var("VINEX_API_KEYS")
                    .map(|keys| {
                        keys.split(',')
                            .map(|s| s.trim().to_string())
                            .filter(|s| !s.is_empty())
                            .collect()
                    })
                    .unwrap_or_default(),
                max_upload_bytes: parse_env_or("VINEX_MAX_UPLOAD_BYTES", 20 * 1024 * 1024),
            },
            enhancement: EnhancementConfig {
                max_image_dimension: parse_env_or("ENHANCE_MAX_DIMENSION", 1600),
                min_image_dimension: parse_env_or("ENHANCE_MIN_DIMENSION", 16),
            },
            model: ModelConfig {
                weights: env::var("DENOISE_WEIGHTS")
                    .unwrap_or_else(|_| "models/dncnn_gray.onnx".to_string()),
                sha256: env::var("DENOISE_WEIGHTS_SHA256").ok(),
                cache_dir: env::var("DENOISE_CACHE_DIR")
                    .unwrap_or_else(|_| ".vinex_cache".to_string()),
                download_timeout_secs: parse_env_or("DENOISE_DOWNLOAD_TIMEOUT", 120),
                output: parse_env_or("DENOISE_OUTPUT", ModelOutput::Denoised),
                threads: parse_env_or("DENOISE_THREADS", 0),
            },
            storage: StorageConfig {
                backend: parse_env_or("STORAGE_BACKEND", storage_defaults.backend),
                local_dir: env::var("STORAGE_LOCAL_DIR").unwrap_or(storage_defaults.local_dir),
                public_base_url: env::var("STORAGE_PUBLIC_BASE_URL")
                    .unwrap_or(storage_defaults.public_base_url),
                folder: env::var("STORAGE_FOLDER").unwrap_or(storage_defaults.folder),
                retention_secs: parse_env_or(
                    "STORAGE_RETENTION_SECS",
                    storage_defaults.retention_secs,
                ),
            },
            recovery: RecoveryConfig {
                schema_dir: env::var("RECOVERY_SCHEMA_DIR").ok(),
            },
            llm: env::var("LLM_MODEL").ok().map(|model| LlmConfig {
                model,
                api_key: env::var("LLM_API_KEY").ok(),
                base_url: env::var("LLM_BASE_URL").ok(),
                timeout_secs: parse_env_or("LLM_TIMEOUT", 60),
                max_retries: parse_env_or("LLM_MAX_RETRIES", 2),
                translation_model: parse_env_opt("LLM_TRANSLATION_MODEL"),
            }),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}

/// Known LLM providers that use OpenAI-compatible APIs
pub const KNOWN_LLM_PROVIDERS: &[&str] = &["openai", "openrouter", "ollama", "lmstudio"];

/// Parse an LLM model name into (provider, model) tuple.
pub fn parse_llm_provider_model(model: &str) -> (&str, &str) {
    if let Some((prefix, rest)) = model.split_once('/') {
        let prefix_lower = prefix.to_lowercase();
        if KNOWN_LLM_PROVIDERS.contains(&prefix_lower.as_str()) {
            return (prefix, rest);
        }
    }
    // Default to treating the whole string as a local model
    ("local", model)
}
