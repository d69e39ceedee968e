//! Command definitions and registry
//!
//! This is the extension point for bot behaviour: a command author builds a
//! [`CommandDefinition`] from [`Phase`] implementations and registers it.

pub mod definition;
pub mod registry;

pub use definition::{
    CommandBuilder, CommandDefinition, Phase, PhaseDefinition, Scope, HELP_COMMAND, START_COMMAND,
    START_PHASE,
};
pub use registry::CommandRegistry;
