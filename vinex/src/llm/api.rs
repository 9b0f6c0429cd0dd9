use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    error::{ApiError, OpenAIError},
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImageArgs,
        ChatCompletionRequestMessageContentPartTextArgs, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContentPart,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
        CreateChatCompletionResponse, ImageDetail, ImageUrlArgs, Stop,
    },
    Client,
};

use crate::{
    config::{parse_llm_provider_model, LlmConfig},
    error::{Result, VinexError},
    llm::provider::CompletionOptions,
};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
const OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";
const LMSTUDIO_BASE_URL: &str = "http://localhost:1234/v1";

#[derive(Debug, Clone)]
struct ApiConfig {
    base_url: String,
    api_key: Option<String>,
    model: String,
    timeout_secs: u64,
    max_retries: u32,
}

#[derive(Clone)]
pub struct LlmApiClient {
    client: Client<OpenAIConfig>,
    config: ApiConfig,
}

impl std::fmt::Debug for LlmApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmApiClient")
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.model)
            .finish()
    }
}

impl LlmApiClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_config = ApiConfig::from_llm_config(config);

        let (provider, _) = parse_llm_provider_model(&config.model);
        let needs_api_key = !matches!(
            provider.to_lowercase().as_str(),
            "ollama" | "local" | "lmstudio"
        );

        if needs_api_key && api_config.api_key.is_none() {
            return Err(VinexError::Llm(
                "API key required for this provider".to_string(),
            ));
        }

        let openai_config = OpenAIConfig::new()
            .with_api_base(api_config.base_url.clone())
            .with_api_key(api_config.api_key.clone().unwrap_or_default());

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(api_config.timeout_secs))
            .build()
            .map_err(|error| {
                VinexError::Llm(format!("Failed to create LLM HTTP client: {error}"))
            })?;

        // async-openai retries server errors on its own for up to 15 minutes
        // by default; cap that at the request timeout so complete() owns retries.
        let backoff = backoff::ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(api_config.timeout_secs)),
            ..Default::default()
        };

        let client = Client::with_config(openai_config)
            .with_http_client(http_client)
            .with_backoff(backoff);

        Ok(Self {
            client,
            config: api_config,
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// One chat completion, retrying transient failures with exponential
    /// backoff. Rate-limit and authentication errors are returned at once.
    pub async fn complete(
        &self,
        prompt: &str,
        image_url: Option<&str>,
        options: &CompletionOptions,
    ) -> Result<String> {
        if prompt.trim().is_empty() {
            return Err(VinexError::Validation("Prompt cannot be empty".to_string()));
        }

        let mut attempt = 0;
        loop {
            let request = self.build_request(prompt, image_url, options)?;

            let error = match self.client.chat().create(request).await {
                Ok(response) => {
                    let content = extract_content(response)?;
                    tracing::debug!(response_len = content.len(), attempt, "LLM response received");
                    return Ok(content);
                }
                Err(error) => error,
            };

            match classify(error) {
                Failure::Transient(error) if attempt < self.config.max_retries => {
                    attempt += 1;
                    let delay = Duration::from_millis(100 << (attempt - 1));
                    tracing::warn!(attempt, ?delay, error = %error, "Retrying LLM completion");
                    tokio::time::sleep(delay).await;
                }
                Failure::Transient(error) | Failure::Fatal(error) => return Err(error),
            }
        }
    }

    fn build_request(
        &self,
        prompt: &str,
        image_url: Option<&str>,
        options: &CompletionOptions,
    ) -> Result<CreateChatCompletionRequest> {
        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::new();

        if let Some(system_prompt) = options
            .system_prompt
            .as_deref()
            .filter(|value| !value.trim().is_empty())
        {
            messages.push(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system_prompt)
                    .build()
                    .map_err(|error| {
                        VinexError::Validation(format!("Invalid system prompt: {error}"))
                    })?
                    .into(),
            );
        }

        let user_message = match image_url {
            Some(url) => {
                let parts: Vec<ChatCompletionRequestUserMessageContentPart> = vec![
                    ChatCompletionRequestMessageContentPartTextArgs::default()
                        .text(prompt)
                        .build()
                        .map_err(|error| {
                            VinexError::Validation(format!("Invalid user prompt: {error}"))
                        })?
                        .into(),
                    ChatCompletionRequestMessageContentPartImageArgs::default()
                        .image_url(
                            ImageUrlArgs::default()
                                .url(url)
                                .detail(ImageDetail::High)
                                .build()
                                .map_err(|error| {
                                    VinexError::Validation(format!("Invalid image URL: {error}"))
                                })?,
                        )
                        .build()
                        .map_err(|error| {
                            VinexError::Validation(format!("Invalid image part: {error}"))
                        })?
                        .into(),
                ];
                ChatCompletionRequestUserMessageArgs::default()
                    .content(parts)
                    .build()
            }
            None => ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build(),
        }
        .map_err(|error| VinexError::Validation(format!("Invalid user prompt: {error}")))?;
        messages.push(user_message.into());

        let model = options
            .model
            .clone()
            .unwrap_or_else(|| self.config.model.clone());

        let mut request = CreateChatCompletionRequestArgs::default();
        request.model(model).messages(messages);
        Self::apply_completion_options(&mut request, options);

        request.build().map_err(|error| {
            VinexError::Validation(format!("Invalid LLM completion request: {error}"))
        })
    }

    fn apply_completion_options(
        request: &mut CreateChatCompletionRequestArgs,
        options: &CompletionOptions,
    ) {
        if let Some(temperature) = options.temperature {
            request.temperature(temperature);
        }

        if let Some(max_tokens) = options.max_tokens {
            request.max_tokens(max_tokens);
        }

        if let Some(top_p) = options.top_p {
            request.top_p(top_p);
        }

        if let Some(stop) = options.stop.as_ref().filter(|values| !values.is_empty()) {
            request.stop(Stop::StringArray(stop.clone()));
        }
    }
}

fn extract_content(response: CreateChatCompletionResponse) -> Result<String> {
    let content = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| VinexError::Llm("LLM response contained no choices".to_string()))?
        .message
        .content
        .unwrap_or_default();

    if content.trim().is_empty() {
        return Err(VinexError::Llm(
            "LLM response contained empty content".to_string(),
        ));
    }
    Ok(content)
}

/// How a failed completion call should be handled.
enum Failure {
    /// Worth another attempt: network errors, 5xx, untyped API errors.
    Transient(VinexError),
    Fatal(VinexError),
}

fn classify(error: OpenAIError) -> Failure {
    match error {
        OpenAIError::Reqwest(err) => match err.status() {
            Some(reqwest::StatusCode::TOO_MANY_REQUESTS) => {
                Failure::Fatal(VinexError::LlmRateLimit { retry_after: None })
            }
            Some(reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN) => {
                Failure::Fatal(VinexError::Llm(format!("LLM authentication failed: {err}")))
            }
            Some(status) if !status.is_server_error() => {
                Failure::Fatal(VinexError::Llm(format!("LLM request failed: {err}")))
            }
            _ => Failure::Transient(VinexError::Llm(format!("LLM request failed: {err}"))),
        },
        OpenAIError::ApiError(api_error) => classify_api_error(api_error),
        OpenAIError::JSONDeserialize(err) => Failure::Fatal(VinexError::Llm(format!(
            "Failed to parse LLM response: {err}"
        ))),
        OpenAIError::InvalidArgument(message) => Failure::Fatal(VinexError::Validation(message)),
        other => Failure::Fatal(VinexError::Llm(other.to_string())),
    }
}

/// Providers report API errors with inconsistent `type`/`code` values, so
/// rate-limit and auth failures are matched on all three fields.
fn classify_api_error(api_error: ApiError) -> Failure {
    let haystack = format!(
        "{} {} {}",
        api_error.message,
        api_error.r#type.as_deref().unwrap_or_default(),
        api_error.code.as_deref().unwrap_or_default()
    )
    .to_lowercase();
    let mentions = |needles: &[&str]| needles.iter().any(|n| haystack.contains(n));

    if mentions(&["rate limit", "rate_limit", "too many requests", "insufficient_quota"]) {
        Failure::Fatal(VinexError::LlmRateLimit { retry_after: None })
    } else if mentions(&["unauthorized", "forbidden", "authentication", "invalid api key", "invalid_api_key"]) {
        Failure::Fatal(VinexError::Llm(format!("LLM authentication failed: {api_error}")))
    } else if api_error.r#type.is_none() && api_error.code.is_none() {
        Failure::Transient(VinexError::Llm(format!("LLM API error: {api_error}")))
    } else {
        Failure::Fatal(VinexError::Llm(format!("LLM API error: {api_error}")))
    }
}

impl ApiConfig {
    fn from_llm_config(config: &LlmConfig) -> Self {
        let (provider, model) = parse_llm_provider_model(&config.model);

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| default_base_url(provider).to_string());

        let normalized_model = if provider.eq_ignore_ascii_case("local") {
            config.model.clone()
        } else {
            model.to_string()
        };

        Self {
            base_url,
            api_key: config.api_key.clone(),
            model: normalized_model,
            timeout_secs: config.timeout_secs,
            max_retries: config.max_retries,
        }
    }
}

fn default_base_url(provider: &str) -> &'static str {
    match provider.to_lowercase().as_str() {
        "openai" => OPENAI_BASE_URL,
        "openrouter" => OPENROUTER_BASE_URL,
        "ollama" => OLLAMA_BASE_URL,
        "lmstudio" => LMSTUDIO_BASE_URL,
        _ => OPENAI_BASE_URL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_openai::types::{ChatCompletionRequestUserMessageContent, ChatCompletionRequestMessage};

    fn test_llm_config() -> LlmConfig {
        LlmConfig {
            model: "ollama/llava".to_string(),
            api_key: None,
            base_url: None,
            timeout_secs: 30,
            max_retries: 0,
            translation_model: None,
        }
    }

    fn user_content(request: &CreateChatCompletionRequest) -> &ChatCompletionRequestUserMessageContent {
        match request.messages.last() {
            Some(ChatCompletionRequestMessage::User(message)) => &message.content,
            other => panic!("expected a user message, got {other:?}"),
        }
    }

    #[test]
    fn test_openai_requires_api_key() {
        let config = LlmConfig {
            model: "openai/gpt-4o".to_string(),
            ..test_llm_config()
        };
        assert!(LlmApiClient::new(&config).is_err());
    }

    #[test]
    fn test_model_prefix_is_stripped() {
        let client = LlmApiClient::new(&test_llm_config()).unwrap();
        assert_eq!(client.model(), "llava");
        assert_eq!(client.config.base_url, OLLAMA_BASE_URL);
    }

    #[test]
    fn test_text_request_has_plain_content() {
        let client = LlmApiClient::new(&test_llm_config()).unwrap();
        let request = client
            .build_request("translate this", None, &CompletionOptions::default())
            .unwrap();

        assert_eq!(request.messages.len(), 1);
        assert!(matches!(
            user_content(&request),
            ChatCompletionRequestUserMessageContent::Text(text) if text == "translate this"
        ));
    }

    #[test]
    fn test_image_request_has_text_and_image_parts() {
        let client = LlmApiClient::new(&test_llm_config()).unwrap();
        let options = CompletionOptions {
            system_prompt: Some("You are a precise OCR extraction model.".to_string()),
            temperature: Some(0.0),
            ..Default::default()
        };
        let request = client
            .build_request("read the card", Some("data:image/png;base64,AQID"), &options)
            .unwrap();

        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.temperature, Some(0.0));
        match user_content(&request) {
            ChatCompletionRequestUserMessageContent::Array(parts) => {
                assert_eq!(parts.len(), 2);
                assert!(matches!(parts[0], ChatCompletionRequestUserMessageContentPart::Text(_)));
                match &parts[1] {
                    ChatCompletionRequestUserMessageContentPart::ImageUrl(image) => {
                        assert_eq!(image.image_url.url, "data:image/png;base64,AQID");
                    }
                    other => panic!("expected image part, got {other:?}"),
                }
            }
            other => panic!("expected multipart content, got {other:?}"),
        }
    }

    #[test]
    fn test_model_override() {
        let client = LlmApiClient::new(&test_llm_config()).unwrap();
        let options = CompletionOptions {
            model: Some("qwen2.5".to_string()),
            ..Default::default()
        };
        let request = client.build_request("hi", None, &options).unwrap();
        assert_eq!(request.model, "qwen2.5");
    }

    fn api_error(message: &str, error_type: Option<&str>, code: Option<&str>) -> ApiError {
        ApiError {
            message: message.to_string(),
            r#type: error_type.map(str::to_string),
            param: None,
            code: code.map(str::to_string),
        }
    }

    #[test]
    fn test_api_error_classification() {
        assert!(matches!(
            classify_api_error(api_error("You exceeded your quota", Some("insufficient_quota"), None)),
            Failure::Fatal(VinexError::LlmRateLimit { .. })
        ));
        assert!(matches!(
            classify_api_error(api_error("Incorrect key", None, Some("invalid_api_key"))),
            Failure::Fatal(VinexError::Llm(message)) if message.contains("authentication failed")
        ));
        assert!(matches!(
            classify_api_error(api_error("upstream hiccup", None, None)),
            Failure::Transient(_)
        ));
        assert!(matches!(
            classify_api_error(api_error("bad model", Some("invalid_request_error"), None)),
            Failure::Fatal(VinexError::Llm(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_prompt_is_rejected() {
        let client = LlmApiClient::new(&test_llm_config()).unwrap();
        let err = client
            .complete("   ", None, &CompletionOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, VinexError::Validation(_)));
    }
}
