//! Command registry
//!
//! Maps invocation tokens to their definitions and produces the help listing
//! in registration order.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use super::definition::CommandDefinition;

/// Registered commands, keyed by token
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    commands: Vec<Arc<CommandDefinition>>,
    index: HashMap<String, usize>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command. Re-registering a token replaces the earlier
    /// definition and keeps its place in the help listing.
    pub fn register(&mut self, definition: CommandDefinition) {
        let token = definition.token().to_string();
        let definition = Arc::new(definition);

        match self.index.get(&token) {
            Some(&position) => {
                debug!(token = %token, "Replacing registered command");
                self.commands[position] = definition;
            }
            None => {
                info!(token = %token, "Registered command");
                self.index.insert(token, self.commands.len());
                self.commands.push(definition);
            }
        }
    }

    pub fn lookup(&self, token: &str) -> Option<Arc<CommandDefinition>> {
        self.index
            .get(token)
            .map(|&position| Arc::clone(&self.commands[position]))
    }

    /// `"token - help"` lines for every non-admin command
    pub fn list_help(&self) -> Vec<String> {
        self.commands
            .iter()
            .filter(|cmd| !cmd.is_admin())
            .map(|cmd| cmd.help_line())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
