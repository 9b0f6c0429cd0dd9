use std::sync::Arc;

use serde_json::Value;

use crate::error::{Result, VinexError};
use crate::llm::{prompts, CompletionOptions, Generator};
use crate::models::{TranslationRequest, Translations};
use crate::recovery::schemas::{self, is_language_code, LANGUAGE_CODES};
use crate::recovery::{recover, RecoveryError};

#[derive(Clone)]
pub struct TranslationService {
    generator: Arc<dyn Generator>,
    model: Option<String>,
}

fn invalid_code_message(role: &str, code: &str) -> String {
    format!(
        "Invalid {role} language code '{code}'. Must be one of: {}",
        LANGUAGE_CODES.join(", ")
    )
}

impl TranslationService {
    /// `model` overrides the generator's default model for translations.
    pub fn new(generator: Arc<dyn Generator>, model: Option<String>) -> Self {
        Self { generator, model }
    }

    /// Validate a request and reduce its targets to the distinct codes other
    /// than the source, in canonical order.
    pub fn plan(request: &TranslationRequest) -> Result<Vec<String>> {
        let source = request.source.trim();
        if source.is_empty() {
            return Err(VinexError::Validation("'source' field is required".to_string()));
        }
        if request.text.trim().is_empty() {
            return Err(VinexError::Validation("'text' field is required".to_string()));
        }
        if request.targets.is_empty() {
            return Err(VinexError::Validation(
                "'targets' must be a non-empty array".to_string(),
            ));
        }
        if !is_language_code(source) {
            return Err(VinexError::Validation(invalid_code_message("source", source)));
        }
        if let Some(bad) = request.targets.iter().find(|t| !is_language_code(t.trim())) {
            return Err(VinexError::Validation(invalid_code_message("target", bad)));
        }

        Ok(LANGUAGE_CODES
            .iter()
            .filter(|code| **code != source && request.targets.iter().any(|t| t.trim() == **code))
            .map(|code| code.to_string())
            .collect())
    }

    pub async fn translate(&self, request: &TranslationRequest) -> Result<Translations> {
        let targets = Self::plan(request)?;
        let source = request.source.trim();

        if targets.is_empty() {
            let mut echo = Translations::new();
            echo.insert(source.to_string(), Value::String(request.text.clone()));
            return Ok(echo);
        }

        let prompt = prompts::translation_prompt(source, &request.text, &targets);
        let options = CompletionOptions {
            system_prompt: Some(prompts::TRANSLATION_SYSTEM_PROMPT.to_string()),
            model: self.model.clone(),
            temperature: Some(0.3),
            max_tokens: Some(500),
            ..Default::default()
        };
        let raw = self.generator.complete(&prompt, None, &options).await?;

        let record = recover(&raw, &schemas::translation(targets.as_slice())).inspect_err(|e| {
            tracing::warn!(source, kind = e.kind(), raw_response = %raw, "Unrecoverable translation response");
        })?;

        match record.into_parts() {
            (Value::Object(translations), _) => {
                let blank: Vec<&str> = translations
                    .iter()
                    .filter(|(_, v)| v.as_str().is_some_and(str::is_empty))
                    .map(|(k, _)| k.as_str())
                    .collect();
                if !blank.is_empty() {
                    tracing::warn!(source, missing = ?blank, "Generator omitted some translations");
                }
                Ok(translations)
            }
            (_, raw) => Err(RecoveryError::SchemaViolation {
                raw,
                missing: vec!["<root> (expected language map)".to_string()],
            }
            .into()),
        }
    }
}
