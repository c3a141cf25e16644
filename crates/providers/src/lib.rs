//! Upstream provider implementations for Simplo.
//!
//! All providers implement the `simplo_core::Provider` trait.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;
