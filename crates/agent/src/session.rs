//! Chat sessions: the caller side of an exchange.
//!
//! A session owns one [`Conversation`] and is its only writer. A send
//! appends the user turn, runs the exchange over a snapshot, and appends
//! the assistant turn only when the exchange succeeds. Failures become
//! display-only [`Notice`]s that never enter the upstream history.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use simplo_core::error::{ErrorKind, ExchangeError};
use simplo_core::message::{Conversation, Message};
use tracing::{debug, warn};

use crate::exchange::ExchangeOrchestrator;

/// A failed exchange, as shown to the user.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub kind: ErrorKind,
    pub detail: String,
    pub created_at: DateTime<Utc>,
    /// Number of conversation turns that precede this notice
    position: usize,
}

impl Notice {
    fn from_error(error: &ExchangeError, position: usize) -> Self {
        let detail = match error {
            ExchangeError::Upstream { payload, .. } => payload.to_pretty_string(),
            other => other.to_string(),
        };
        Self {
            kind: error.kind(),
            detail,
            created_at: Utc::now(),
            position,
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "⚠️ {}", self.detail)
    }
}

/// One line of the visible chat, in display order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TranscriptEntry<'a> {
    Turn(&'a Message),
    Notice(&'a Notice),
}

pub struct ChatSession {
    orchestrator: Arc<ExchangeOrchestrator>,
    conversation: Conversation,
    notices: Vec<Notice>,
    last_usage: Option<serde_json::Value>,
}

impl ChatSession {
    pub fn new(orchestrator: Arc<ExchangeOrchestrator>) -> Self {
        Self {
            orchestrator,
            conversation: Conversation::new(),
            notices: Vec::new(),
            last_usage: None,
        }
    }

    /// Send a user turn and wait for the reply.
    ///
    /// An invalid turn is rejected before it is stored. Any other failure
    /// leaves the user turn in place, adds no assistant turn, and records a
    /// notice.
    pub async fn send(&mut self, message: Message) -> Result<&Message, ExchangeError> {
        message.validate()?;
        self.conversation.append(message);
        let snapshot = self.conversation.snapshot();

        debug!(conversation_id = %self.conversation.id, turns = snapshot.len(), "Sending turn");

        let result = self
            .orchestrator
            .exchange(&snapshot)
            .await
            .and_then(|completion| {
                if completion.text.trim().is_empty() {
                    Err(ExchangeError::ContractViolation(
                        "upstream returned an empty reply".into(),
                    ))
                } else {
                    Ok(completion)
                }
            });

        match result {
            Ok(completion) => {
                self.last_usage = completion.usage;
                Ok(self.conversation.append(Message::assistant(completion.text)))
            }
            Err(e) => {
                warn!(conversation_id = %self.conversation.id, kind = %e.kind(), "Turn failed");
                self.notices
                    .push(Notice::from_error(&e, self.conversation.len()));
                Err(e)
            }
        }
    }

    /// Turns and notices interleaved in the order they happened.
    pub fn transcript(&self) -> Vec<TranscriptEntry<'_>> {
        let mut entries = Vec::with_capacity(self.conversation.len() + self.notices.len());
        let mut notices = self.notices.iter().peekable();
        for (index, message) in self.conversation.messages().iter().enumerate() {
            while let Some(notice) = notices.next_if(|n| n.position <= index) {
                entries.push(TranscriptEntry::Notice(notice));
            }
            entries.push(TranscriptEntry::Turn(message));
        }
        entries.extend(notices.map(TranscriptEntry::Notice));
        entries
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Usage reported by the most recent successful exchange.
    pub fn last_usage(&self) -> Option<&serde_json::Value> {
        self.last_usage.as_ref()
    }
}
