//! Chat relay for SkillRelay.
//!
//! Grounds every user question in the platform guide and walks a fixed,
//! ordered list of candidate models until one of them answers.
//!
//! ```text
//!   message ──► validate ──► [system turn, user turn]
//!                                  │
//!        ┌─────────────────────────┘
//!        ▼
//!   model 1 ──fail──► model 2 ──fail──► … ──fail──► AllModelsExhausted
//!      │ ok              │ ok
//!      ▼                 ▼
//!   ChatReply         ChatReply
//! ```

pub mod context;
pub mod relay;

pub use context::{ContextStore, PLATFORM_DOCS};
pub use relay::{
    AttemptOutcome, ChatRelay, ChatReply, DEGRADED_REPLY, RelaySettings, SYSTEM_PREAMBLE,
};
