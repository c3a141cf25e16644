//! The conversation exchange pipeline.
//!
//! A chat turn flows through two layers:
//!
//! 1. **Session** ([`ChatSession`]): owns the conversation, validates and
//!    appends the user turn, and decides what the user sees on failure
//! 2. **Orchestrator** ([`ExchangeOrchestrator`]): picks the text or vision
//!    model, builds the upstream request from a frozen snapshot, and makes
//!    exactly one provider call
//!
//! The orchestrator keeps no state between calls, so one instance can be
//! shared behind an `Arc` by every session and by the HTTP gateway.

pub mod exchange;
pub mod session;

#[cfg(test)]
mod test_helpers;

pub use exchange::{ExchangeOrchestrator, ExchangeSettings, ModelProfile, ModelTier};
pub use session::{ChatSession, Notice, TranscriptEntry};
