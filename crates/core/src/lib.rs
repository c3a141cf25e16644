//! # Simplo Core
//!
//! Domain types, traits, and error definitions for the Simplo chat client.
//! This crate has **no HTTP dependencies**. It defines the conversation model
//! and the upstream request shape that every other crate builds against.
//!
//! ## Layout
//!
//! - [`message`]: turns, inline images, and the append-only conversation store
//! - [`provider`]: the upstream request/response values and the `Provider` seam
//! - [`error`]: the classified failure taxonomy
//! - [`render`]: the display-time markup normalizer

pub mod error;
pub mod message;
pub mod provider;
pub mod render;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ErrorKind, ExchangeError, Result, UpstreamPayload};
pub use message::{Conversation, ConversationId, DataUri, Message, Role};
pub use provider::{
    Completion, ContentPart, ExchangeResult, Provider, UpstreamContent, UpstreamMessage,
    UpstreamRequest, UpstreamRole,
};
pub use render::normalize;
