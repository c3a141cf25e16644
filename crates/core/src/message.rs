//! Message and Conversation domain types.
//!
//! These are the value objects that flow through the whole client:
//! user types a turn → it is appended to the Conversation → a snapshot goes
//! to the exchange orchestrator → the assistant's reply is appended back.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ExchangeError;

/// Unique identifier for a conversation (session).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The AI assistant
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// An inline image encoded as `data:<mime>;base64,<payload>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DataUri(String);

impl DataUri {
    /// Validate a data URI string.
    pub fn parse(uri: impl Into<String>) -> Result<Self, ExchangeError> {
        let uri = uri.into();
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| ExchangeError::Input("image is not a data URI".into()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| ExchangeError::Input("data URI has no payload separator".into()))?;
        if !header.ends_with(";base64") {
            return Err(ExchangeError::Input(
                "data URI payload must be base64-encoded".into(),
            ));
        }
        if header.split(';').next().is_none_or(str::is_empty) {
            return Err(ExchangeError::Input("data URI has no MIME type".into()));
        }
        if payload.is_empty() {
            return Err(ExchangeError::Input("data URI payload is empty".into()));
        }
        Ok(Self(uri))
    }

    /// Encode raw bytes with the given MIME type.
    pub fn from_bytes(mime_type: &str, bytes: &[u8]) -> Self {
        Self(format!("data:{mime_type};base64,{}", STANDARD.encode(bytes)))
    }

    /// The embedded MIME type, e.g. `image/png`.
    pub fn mime_type(&self) -> &str {
        self.0
            .strip_prefix("data:")
            .and_then(|rest| rest.split([';', ',']).next())
            .unwrap_or_default()
    }

    pub fn is_image(&self) -> bool {
        self.mime_type().starts_with("image/")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DataUri {
    type Error = ExchangeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<DataUri> for String {
    fn from(uri: DataUri) -> Self {
        uri.0
    }
}

impl std::fmt::Display for DataUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single turn in a conversation. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    id: String,
    role: Role,
    text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image: Option<DataUri>,
    created_at: DateTime<Utc>,
}

impl Message {
    fn new(role: Role, text: String, image: Option<DataUri>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            text,
            image,
            created_at: Utc::now(),
        }
    }

    /// Create a new user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text.into(), None)
    }

    /// Create a user message carrying an inline image.
    pub fn user_with_image(text: impl Into<String>, image: DataUri) -> Self {
        Self::new(Role::User, text.into(), Some(image))
    }

    /// Create a new assistant message.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text.into(), None)
    }

    /// Build a message from parts received over the wire.
    pub fn from_parts(role: Role, text: impl Into<String>, image: Option<DataUri>) -> Self {
        Self::new(role, text.into(), image)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn image(&self) -> Option<&DataUri> {
        self.image.as_ref()
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    /// Display-only timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Text may be blank only when an image carries the turn.
    pub fn validate(&self) -> Result<(), ExchangeError> {
        match &self.image {
            None if self.text.trim().is_empty() => Err(ExchangeError::Input(format!(
                "{} message {} has neither text nor image",
                self.role.as_str(),
                self.id
            ))),
            Some(image) if !image.is_image() => Err(ExchangeError::Input(format!(
                "attachment on message {} is {}, not an image",
                self.id,
                image.mime_type()
            ))),
            _ => Ok(()),
        }
    }
}

/// The conversation store: an append-only, ordered sequence of messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique conversation ID
    pub id: ConversationId,

    /// When this conversation was created
    pub created_at: DateTime<Utc>,

    /// When the last message was added
    pub updated_at: DateTime<Utc>,

    messages: Vec<Message>,
}

impl Conversation {
    /// Create a new empty conversation.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: ConversationId::new(),
            created_at: now,
            updated_at: now,
            messages: Vec::new(),
        }
    }

    /// Add a message to the end of the conversation.
    pub fn append(&mut self, message: Message) -> &Message {
        self.updated_at = Utc::now();
        let index = self.messages.len();
        self.messages.push(message);
        &self.messages[index]
    }

    /// A frozen copy of the history; later appends do not affect it.
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Whether any turn so far carried an image.
    pub fn has_image(&self) -> bool {
        self.messages.iter().any(Message::has_image)
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PIXEL: &str = "data:image/png;base64,iVBORw0KGgo=";

    #[test]
    fn create_user_message() {
        let msg = Message::user("Hello!");
        assert_eq!(msg.role(), Role::User);
        assert_eq!(msg.text(), "Hello!");
        assert!(msg.image().is_none());
        assert!(msg.validate().is_ok());
    }

    #[test]
    fn empty_text_requires_image() {
        assert!(matches!(
            Message::user("   ").validate(),
            Err(ExchangeError::Input(_))
        ));
        let uri = DataUri::parse(PIXEL).unwrap();
        assert!(Message::user_with_image("", uri).validate().is_ok());
    }

    #[test]
    fn non_image_attachment_rejected() {
        let uri = DataUri::parse("data:application/pdf;base64,JVBERi0=").unwrap();
        let err = Message::user_with_image("read this", uri).validate().unwrap_err();
        assert!(err.to_string().contains("application/pdf"));
    }

    #[test]
    fn data_uri_parsing() {
        let uri = DataUri::parse(PIXEL).unwrap();
        assert_eq!(uri.mime_type(), "image/png");
        assert!(uri.is_image());

        assert!(DataUri::parse("https://example.com/cat.png").is_err());
        assert!(DataUri::parse("data:image/png;base64").is_err());
        assert!(DataUri::parse("data:image/png,rawbytes").is_err());
        assert!(DataUri::parse("data:;base64,AAAA").is_err());
        assert!(DataUri::parse("data:image/png;base64,").is_err());
    }

    #[test]
    fn data_uri_from_bytes() {
        let uri = DataUri::from_bytes("image/jpeg", b"hi");
        assert_eq!(uri.as_str(), "data:image/jpeg;base64,aGk=");
        assert_eq!(uri.mime_type(), "image/jpeg");
    }

    #[test]
    fn data_uri_deserialization_validates() {
        let ok: Result<DataUri, _> = serde_json::from_str(&format!("\"{PIXEL}\""));
        assert!(ok.is_ok());
        let bad: Result<DataUri, _> = serde_json::from_str("\"not-a-uri\"");
        assert!(bad.is_err());
    }

    #[test]
    fn conversation_appends_in_order() {
        let mut conv = Conversation::new();
        let created = conv.created_at;

        conv.append(Message::user("First"));
        conv.append(Message::assistant("Second"));
        assert_eq!(conv.len(), 2);
        assert_eq!(conv.messages()[0].text(), "First");
        assert_eq!(conv.last().map(Message::role), Some(Role::Assistant));
        assert!(conv.updated_at >= created);
    }

    #[test]
    fn snapshot_is_frozen() {
        let mut conv = Conversation::new();
        conv.append(Message::user("one"));
        let snapshot = conv.snapshot();
        conv.append(Message::assistant("two"));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(conv.len(), 2);
    }

    #[test]
    fn has_image_scans_whole_history() {
        let mut conv = Conversation::new();
        conv.append(Message::user("text"));
        assert!(!conv.has_image());
        conv.append(Message::user_with_image("look", DataUri::parse(PIXEL).unwrap()));
        conv.append(Message::assistant("a cat"));
        conv.append(Message::user("what color?"));
        assert!(conv.has_image());
    }

    #[test]
    fn message_serialization_roundtrip() {
        let msg = Message::user_with_image("see", DataUri::parse(PIXEL).unwrap());
        let json = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }
}
