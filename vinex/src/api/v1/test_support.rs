use std::sync::Arc;

use async_trait::async_trait;

use crate::api::state::AppState;
use crate::config::{
    Config, EnhancementConfig, ModelConfig, ModelOutput, RecoveryConfig, ServerConfig,
    StorageConfig,
};
use crate::denoise::{Activation, ConvLayer, DenoiseEngine, DenoiseModel};
use crate::error::{Result, VinexError};
use crate::llm::{CompletionOptions, Generator};
use crate::recovery::SchemaRegistry;
use crate::storage::InlineObjectStore;

/// Replies with a fixed text, or reports itself unavailable.
pub(crate) struct ScriptedGenerator {
    reply: Option<String>,
}

impl ScriptedGenerator {
    pub(crate) fn replying(reply: &str) -> Arc<dyn Generator> {
        Arc::new(Self {
            reply: Some(reply.to_string()),
        })
    }

    pub(crate) fn unavailable() -> Arc<dyn Generator> {
        Arc::new(Self { reply: None })
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn complete(
        &self,
        _prompt: &str,
        _image_url: Option<&str>,
        _options: &CompletionOptions,
    ) -> Result<String> {
        self.reply
            .clone()
            .ok_or_else(|| VinexError::LlmUnavailable("No LLM configuration provided".into()))
    }

    fn is_available(&self) -> bool {
        self.reply.is_some()
    }
}

pub(crate) fn test_config(api_keys: Vec<String>) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            api_keys,
            max_upload_bytes: 1024 * 1024,
        },
        enhancement: EnhancementConfig {
            max_image_dimension: 64,
            min_image_dimension: 16,
        },
        model: ModelConfig {
            weights: "models/test.onnx".to_string(),
            sha256: None,
            cache_dir: ".vinex_cache".to_string(),
            download_timeout_secs: 5,
            output: ModelOutput::Denoised,
            threads: 0,
        },
        storage: StorageConfig::default(),
        recovery: RecoveryConfig { schema_dir: None },
        llm: None,
    }
}

/// Two-layer model whose residual is always zero.
pub(crate) fn zero_residual_engine() -> DenoiseEngine {
    let head = ConvLayer::new(1, 1, 3, vec![0.0; 9], None, Activation::Relu).unwrap();
    let tail = ConvLayer::new(1, 1, 3, vec![0.0; 9], None, Activation::None).unwrap();
    DenoiseEngine::from_model(DenoiseModel::new(vec![head, tail]).unwrap())
}

pub(crate) fn test_state(api_keys: Vec<String>, generator: Arc<dyn Generator>) -> AppState {
    AppState::new(
        test_config(api_keys),
        zero_residual_engine(),
        generator,
        Arc::new(InlineObjectStore::new("vin-temp")),
        SchemaRegistry::builtin(),
    )
}
