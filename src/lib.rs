//! PhaseBot
//!
//! A command-dispatch and multi-turn conversation engine for Telegram bots.
//! Commands are small state machines of named phases; the engine keeps one
//! conversation per user and advances it one step per inbound message.

pub mod commands;
pub mod config;
pub mod dispatch;
pub mod handlers;
pub mod messaging;
pub mod state;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{PhaseBotError, Result};

// Re-export main components for easy access
pub use commands::{CommandDefinition, CommandRegistry, Phase, PhaseDefinition, Scope};
pub use dispatch::{DispatchEngine, InboundMessage, Routing, StepOutcome};
pub use messaging::{Messenger, OutboundMessage, TeloxideMessenger};
pub use state::{ContextStore, ConversationContext};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
