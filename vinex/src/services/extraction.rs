use std::sync::Arc;

use crate::config::EnhancementConfig;
use crate::enhance::{preprocessing, Enhancer};
use crate::error::{Result, VinexError};
use crate::llm::{prompts, CompletionOptions, Generator};
use crate::models::{ExtractionResult, VinFields};
use crate::recovery::{recover, schemas};
use crate::storage::{enhanced_name, ObjectStore};

/// Upload → enhance → publish → read fields → recover.
#[derive(Clone)]
pub struct ExtractionService {
    enhancer: Enhancer,
    store: Arc<dyn ObjectStore>,
    generator: Arc<dyn Generator>,
    config: EnhancementConfig,
}

impl ExtractionService {
    pub fn new(
        enhancer: Enhancer,
        store: Arc<dyn ObjectStore>,
        generator: Arc<dyn Generator>,
        config: EnhancementConfig,
    ) -> Self {
        Self {
            enhancer,
            store,
            generator,
            config,
        }
    }

    /// Decode, bound and enhance an uploaded image, returning PNG bytes.
    pub async fn enhance_upload(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        let image = preprocessing::decode(bytes)?;
        preprocessing::ensure_min_dimension(&image, self.config.min_image_dimension)?;
        let image = preprocessing::downscale_to_fit(&image, self.config.max_image_dimension);
        let enhanced = self.enhancer.enhance(image).await?;
        preprocessing::encode_png(&enhanced)
    }

    pub async fn extract(&self, filename: &str, bytes: &[u8]) -> Result<ExtractionResult> {
        if !self.generator.is_available() {
            return Err(VinexError::LlmUnavailable(
                "document extraction requires a configured LLM".to_string(),
            ));
        }

        let png = self.enhance_upload(bytes).await?;

        let key = self.store.key(&enhanced_name(filename));
        let image_url = self.store.put(png, &key, "image/png").await?;
        tracing::info!(filename, key = %key, backend = self.store.backend(), "Published enhanced image");

        let options = CompletionOptions {
            system_prompt: Some(prompts::VIN_SYSTEM_PROMPT.to_string()),
            temperature: Some(0.0),
            ..Default::default()
        };
        let raw = self
            .generator
            .complete(&prompts::vin_extraction_prompt(), Some(&image_url), &options)
            .await?;

        let record = recover(&raw, &schemas::vin_fields()).inspect_err(|e| {
            tracing::warn!(filename, kind = e.kind(), raw_response = %raw, "Unrecoverable VIN response");
        })?;
        let fields: VinFields = record.deserialize()?;

        if fields.is_empty() {
            tracing::info!(filename, "No VIN fields recognised");
        }

        Ok(ExtractionResult {
            filename: filename.to_string(),
            image_url,
            fields,
            raw_response: raw,
        })
    }
}
