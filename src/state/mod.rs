//! State management module
//!
//! This module handles conversation state and per-user context storage

pub mod context;
pub mod storage;

// Re-export commonly used state components
pub use context::{ContextSummary, ConversationContext, PhaseState};
pub use storage::{ContextStore, UserSlot};
