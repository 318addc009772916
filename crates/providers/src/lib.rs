//! Inference provider implementations for SkillRelay.
//!
//! All providers implement the `skillrelay_core::Provider` trait.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;
