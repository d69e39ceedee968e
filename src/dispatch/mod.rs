//! Message dispatch module
//!
//! Inbound message model, tokenizing, and the engine that routes messages
//! to commands and conversations.

pub mod engine;
pub mod fallback;
pub mod message;

pub use engine::{DispatchEngine, Routing, StepOutcome};
pub use fallback::{Fallback, HintFallback, NoopFallback};
pub use message::{ChatInfo, ChatKind, InboundMessage, Sender};
