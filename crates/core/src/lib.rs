//! # SkillRelay Core
//!
//! Domain types, traits, and error definitions for the SkillRelay chat relay.
//! This crate has **zero framework dependencies** — it defines the model that
//! the provider, relay and gateway crates implement against.
//!
//! The inference backend is a trait here so the relay can be driven by a real
//! HTTP client in production and by scripted stubs in tests.

pub mod error;
pub mod message;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use error::{AttemptFailure, ProviderError, RelayError};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
