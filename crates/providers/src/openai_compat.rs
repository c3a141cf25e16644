//! OpenAI-compatible provider implementation.
//!
//! Works with OpenRouter, OpenAI, and any endpoint that speaks the
//! `/chat/completions` protocol, including image content blocks.
//!
//! One `complete()` call is one POST: no retries, no timeout override, no
//! state kept between calls. The `reqwest::Client` is held only for
//! connection reuse.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use simplo_config::{AppConfig, ConfigError};
use simplo_core::error::{ExchangeError, UpstreamPayload};
use simplo_core::provider::*;
use tracing::{debug, warn};

/// An OpenAI-compatible chat-completion provider.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a new OpenAI-compatible provider.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Create an OpenRouter provider (convenience constructor).
    pub fn openrouter(api_key: impl Into<String>) -> Self {
        Self::new("openrouter", "https://openrouter.ai/api/v1", api_key)
    }

    /// Build from configuration. Fails when no credential is configured.
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let api_key = config.require_api_key()?;
        Ok(Self::new(
            provider_name(&config.api_url),
            &config.api_url,
            api_key,
        ))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Convert upstream turns to OpenAI API format.
    fn to_api_messages(messages: &[UpstreamMessage]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: m.role.as_str(),
                content: match &m.content {
                    UpstreamContent::Text(text) => ApiContent::Text(text.clone()),
                    UpstreamContent::Parts(parts) => ApiContent::Parts(
                        parts
                            .iter()
                            .map(|part| match part {
                                ContentPart::Text(text) => {
                                    ApiContentPart::Text { text: text.clone() }
                                }
                                ContentPart::Image(url) => ApiContentPart::ImageUrl {
                                    image_url: ApiImageUrl { url: url.clone() },
                                },
                            })
                            .collect(),
                    ),
                },
            })
            .collect()
    }

    /// Validate a 2xx body and extract the completion.
    fn parse_completion(body: &str) -> ExchangeResult {
        let api_response: ApiResponse = serde_json::from_str(body).map_err(|e| {
            ExchangeError::ContractViolation(format!("response is not a chat completion: {e}"))
        })?;

        let choice = api_response.choices.into_iter().next().ok_or_else(|| {
            ExchangeError::ContractViolation("no choices in response".into())
        })?;

        let message = choice.message.ok_or_else(|| {
            ExchangeError::ContractViolation("first choice has no message".into())
        })?;

        let text = message.content.ok_or_else(|| {
            ExchangeError::ContractViolation("first choice message has no content".into())
        })?;

        Ok(Completion {
            text,
            usage: api_response.usage,
            model: api_response.model,
        })
    }
}

/// Name a provider after its endpoint, for logs.
fn provider_name(api_url: &str) -> &'static str {
    if api_url.contains("openrouter.ai") {
        "openrouter"
    } else if api_url.contains("api.openai.com") {
        "openai"
    } else {
        "openai-compat"
    }
}

#[async_trait]
impl Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: UpstreamRequest) -> ExchangeResult {
        let url = format!("{}/chat/completions", self.base_url);

        let body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.messages),
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        });

        debug!(
            provider = %self.name,
            model = %request.model,
            turns = request.messages.len(),
            "Sending completion request"
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ExchangeError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ExchangeError::Transport(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            let payload = UpstreamPayload::from_body(&text);
            warn!(
                provider = %self.name,
                status = status.as_u16(),
                body = %payload,
                "Provider returned error"
            );
            return Err(ExchangeError::Upstream {
                status: status.as_u16(),
                payload,
            });
        }

        let completion = Self::parse_completion(&text).inspect_err(|e| {
            warn!(provider = %self.name, error = %e, "Provider response failed validation");
        })?;

        debug!(
            provider = %self.name,
            model = completion.model.as_deref().unwrap_or(request.model.as_str()),
            chars = completion.text.len(),
            "Completion received"
        );

        Ok(completion)
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: &'static str,
    content: ApiContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ApiContent {
    Text(String),
    Parts(Vec<ApiContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiContentPart {
    Text { text: String },
    ImageUrl { image_url: ApiImageUrl },
}

#[derive(Debug, Serialize)]
struct ApiImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<ApiChoice>,
    #[serde(default)]
    usage: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    #[serde(default)]
    message: Option<ApiResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PIXEL: &str = "data:image/png;base64,iVBORw0KGgo=";

    #[test]
    fn openrouter_constructor() {
        let provider = OpenAiCompatProvider::openrouter("sk-test");
        assert_eq!(provider.name(), "openrouter");
        assert!(provider.base_url().contains("openrouter.ai"));
    }

    #[test]
    fn trailing_slash_trimmed() {
        let provider = OpenAiCompatProvider::new("local", "http://localhost:8080/v1/", "k");
        assert_eq!(provider.base_url(), "http://localhost:8080/v1");
    }

    #[test]
    fn from_config_requires_key() {
        let config = AppConfig::default();
        assert!(matches!(
            OpenAiCompatProvider::from_config(&config),
            Err(ConfigError::MissingApiKey)
        ));

        let config = AppConfig {
            api_key: Some("sk-or".into()),
            ..AppConfig::default()
        };
        let provider = OpenAiCompatProvider::from_config(&config).unwrap();
        assert_eq!(provider.name(), "openrouter");
    }

    #[test]
    fn text_turn_serializes_as_string_content() {
        let messages = vec![
            UpstreamMessage::system("You are helpful"),
            UpstreamMessage {
                role: UpstreamRole::User,
                content: UpstreamContent::Text("Hello".into()),
            },
        ];
        let json = serde_json::to_value(OpenAiCompatProvider::to_api_messages(&messages)).unwrap();
        assert_eq!(
            json,
            json!([
                {"role": "system", "content": "You are helpful"},
                {"role": "user", "content": "Hello"},
            ])
        );
    }

    #[test]
    fn image_turn_serializes_as_content_blocks() {
        let messages = vec![UpstreamMessage {
            role: UpstreamRole::User,
            content: UpstreamContent::Parts(vec![
                ContentPart::Text("What is this?".into()),
                ContentPart::Image(PIXEL.into()),
            ]),
        }];
        let json = serde_json::to_value(OpenAiCompatProvider::to_api_messages(&messages)).unwrap();
        assert_eq!(
            json,
            json!([{
                "role": "user",
                "content": [
                    {"type": "text", "text": "What is this?"},
                    {"type": "image_url", "image_url": {"url": PIXEL}},
                ]
            }])
        );
    }

    #[test]
    fn parse_valid_completion() {
        let body = r#"{
            "id": "gen-1",
            "model": "openai/gpt-4o-mini",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "**Hi** there"}}],
            "usage": {"tokens": 12}
        }"#;
        let completion = OpenAiCompatProvider::parse_completion(body).unwrap();
        assert_eq!(completion.text, "**Hi** there");
        assert_eq!(completion.usage, Some(json!({"tokens": 12})));
        assert_eq!(completion.model.as_deref(), Some("openai/gpt-4o-mini"));
    }

    #[test]
    fn usage_is_optional() {
        let body = r#"{"choices":[{"message":{"content":"ok"}}]}"#;
        let completion = OpenAiCompatProvider::parse_completion(body).unwrap();
        assert!(completion.usage.is_none());
        assert!(completion.model.is_none());
    }

    #[test]
    fn empty_choices_is_contract_violation() {
        let err = OpenAiCompatProvider::parse_completion(r#"{"choices":[]}"#).unwrap_err();
        assert!(matches!(err, ExchangeError::ContractViolation(_)));
    }

    #[test]
    fn null_message_is_contract_violation() {
        let err =
            OpenAiCompatProvider::parse_completion(r#"{"choices":[{"message":null}]}"#).unwrap_err();
        assert!(matches!(err, ExchangeError::ContractViolation(_)));
    }

    #[test]
    fn null_content_is_contract_violation() {
        let body = r#"{"choices":[{"message":{"content":null}}]}"#;
        let err = OpenAiCompatProvider::parse_completion(body).unwrap_err();
        assert!(matches!(err, ExchangeError::ContractViolation(_)));
    }

    #[test]
    fn missing_choices_is_contract_violation() {
        let err = OpenAiCompatProvider::parse_completion(r#"{"object":"error"}"#).unwrap_err();
        assert!(matches!(err, ExchangeError::ContractViolation(_)));
    }

    #[test]
    fn non_json_success_body_is_contract_violation() {
        let err = OpenAiCompatProvider::parse_completion("<html>ok</html>").unwrap_err();
        assert!(matches!(err, ExchangeError::ContractViolation(_)));
    }

    #[test]
    fn provider_names_from_urls() {
        assert_eq!(provider_name("https://openrouter.ai/api/v1"), "openrouter");
        assert_eq!(provider_name("https://api.openai.com/v1"), "openai");
        assert_eq!(provider_name("http://localhost:11434/v1"), "openai-compat");
    }
}
