//! The exchange orchestrator.
//!
//! Turns one conversation snapshot into exactly one upstream call:
//!
//! 1. **Select** the model tier: vision if any turn in the history carries
//!    an image, text otherwise
//! 2. **Build** the request: system turn first, then every message
//!    translated into plain or multi-part content
//! 3. **Call** the provider once and hand back its classified result
//!
//! Nothing is cached between calls. The tier is re-evaluated every time,
//! since a conversation can start text-only and acquire an image later.

use std::sync::Arc;

use simplo_config::AppConfig;
use simplo_core::error::ExchangeError;
use simplo_core::message::Message;
use simplo_core::provider::{
    ContentPart, ExchangeResult, Provider, UpstreamContent, UpstreamMessage, UpstreamRequest,
    UpstreamRole,
};
use tracing::{debug, info, warn};

/// Which model variant addresses a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    Text,
    Vision,
}

impl ModelTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Vision => "vision",
        }
    }
}

/// A model identifier paired with the system instruction sent to it.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelProfile {
    pub model: String,
    pub system_prompt: String,
}

/// Static generation settings. Not derived from input.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeSettings {
    pub text: ModelProfile,
    pub vision: ModelProfile,

    /// Text part sent alongside an image when the turn has no text
    pub image_placeholder: String,

    pub temperature: f64,
    pub max_tokens: u32,
}

impl ExchangeSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            text: ModelProfile {
                model: config.models.text.clone(),
                system_prompt: config.prompts.text_system.clone(),
            },
            vision: ModelProfile {
                model: config.models.vision.clone(),
                system_prompt: config.prompts.vision_system.clone(),
            },
            image_placeholder: config.prompts.image_placeholder.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    pub fn profile(&self, tier: ModelTier) -> &ModelProfile {
        match tier {
            ModelTier::Text => &self.text,
            ModelTier::Vision => &self.vision,
        }
    }
}

impl Default for ExchangeSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Builds and issues one upstream request per call.
pub struct ExchangeOrchestrator {
    provider: Arc<dyn Provider>,
    settings: ExchangeSettings,
}

impl ExchangeOrchestrator {
    pub fn new(provider: Arc<dyn Provider>, settings: ExchangeSettings) -> Self {
        Self { provider, settings }
    }

    pub fn settings(&self) -> &ExchangeSettings {
        &self.settings
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Vision if any message anywhere in the history carries an image.
    pub fn select_tier(history: &[Message]) -> ModelTier {
        if history.iter().any(Message::has_image) {
            ModelTier::Vision
        } else {
            ModelTier::Text
        }
    }

    /// Translate a history into an upstream request.
    ///
    /// Rejects an empty history, or any message that breaks the message
    /// invariants, before anything touches the network.
    pub fn build_request(&self, history: &[Message]) -> Result<UpstreamRequest, ExchangeError> {
        self.build_request_for(Self::select_tier(history), history)
    }

    fn build_request_for(
        &self,
        tier: ModelTier,
        history: &[Message],
    ) -> Result<UpstreamRequest, ExchangeError> {
        if history.is_empty() {
            return Err(ExchangeError::Input("conversation history is empty".into()));
        }
        for message in history {
            message.validate()?;
        }

        let profile = self.settings.profile(tier);

        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(UpstreamMessage::system(&profile.system_prompt));
        messages.extend(history.iter().map(|m| self.translate(m)));

        Ok(UpstreamRequest {
            model: profile.model.clone(),
            messages,
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        })
    }

    fn translate(&self, message: &Message) -> UpstreamMessage {
        let content = match message.image() {
            None => UpstreamContent::Text(message.text().to_string()),
            Some(image) => {
                let text = if message.text().trim().is_empty() {
                    self.settings.image_placeholder.clone()
                } else {
                    message.text().to_string()
                };
                UpstreamContent::Parts(vec![
                    ContentPart::Text(text),
                    ContentPart::Image(image.as_str().to_string()),
                ])
            }
        };
        UpstreamMessage {
            role: UpstreamRole::from(message.role()),
            content,
        }
    }

    /// Run one exchange over a frozen history.
    pub async fn exchange(&self, history: &[Message]) -> ExchangeResult {
        let tier = Self::select_tier(history);
        let request = self.build_request_for(tier, history)?;

        info!(
            provider = %self.provider.name(),
            model = %request.model,
            tier = tier.as_str(),
            turns = history.len(),
            "Starting exchange"
        );

        match self.provider.complete(request).await {
            Ok(completion) => {
                debug!(
                    chars = completion.text.len(),
                    has_usage = completion.usage.is_some(),
                    "Exchange completed"
                );
                Ok(completion)
            }
            Err(e) => {
                warn!(kind = %e.kind(), error = %e, "Exchange failed");
                Err(e)
            }
        }
    }
}
