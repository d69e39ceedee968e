//! Command and phase definitions
//!
//! A command is a small state machine: a closed table of named phases,
//! entered at `"start"` and advanced along each phase's `next_phase`.
//! Tables are validated when the command is built, so a conversation can
//! never reach a phase name that does not exist in its table.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::dispatch::message::InboundMessage;
use crate::messaging::OutboundMessage;
use crate::state::context::ConversationContext;
use crate::utils::errors::{PhaseBotError, Result};

/// Name of the initial phase every command must define
pub const START_PHASE: &str = "start";

/// Answered by the engine with the help header
pub const START_COMMAND: &str = "/start";

/// Answered by the engine with the help header and command listing
pub const HELP_COMMAND: &str = "/help";

/// Where a command may be invoked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// One-on-one chats with the bot only
    Private,
    All,
}

/// Behaviour of a single phase.
///
/// Every method has a default so a phase only implements what it needs.
#[async_trait]
pub trait Phase: Send + Sync {
    /// Runs once per conversation, on the invocation that created it.
    /// Only called for the `"start"` phase.
    async fn init(
        &self,
        _ctx: &mut ConversationContext,
        _msg: &InboundMessage,
        _tokens: &[String],
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// Decides whether the input may advance the conversation
    fn validate_input(
        &self,
        _ctx: &ConversationContext,
        _msg: &InboundMessage,
        _tokens: &[String],
    ) -> bool {
        true
    }

    /// Side effects for accepted input. An error keeps the conversation in
    /// its current phase.
    async fn on_valid_input(
        &self,
        _ctx: &mut ConversationContext,
        _msg: &InboundMessage,
        _tokens: &[String],
    ) -> anyhow::Result<()> {
        Ok(())
    }
}

/// One node of a command's phase table
#[derive(Clone)]
pub struct PhaseDefinition {
    pub handler: Arc<dyn Phase>,
    /// Successor phase, `None` if this phase ends the conversation
    pub next_phase: Option<String>,
    /// Sent when a previous phase advances into this one
    pub start_message: Option<OutboundMessage>,
    /// Sent when input fails validation
    pub error_message: Option<OutboundMessage>,
}

impl PhaseDefinition {
    pub fn new(handler: impl Phase + 'static) -> Self {
        Self::from_arc(Arc::new(handler))
    }

    pub fn from_arc(handler: Arc<dyn Phase>) -> Self {
        Self {
            handler,
            next_phase: None,
            start_message: None,
            error_message: None,
        }
    }

    pub fn next(mut self, phase: impl Into<String>) -> Self {
        self.next_phase = Some(phase.into());
        self
    }

    pub fn start_message(mut self, message: OutboundMessage) -> Self {
        self.start_message = Some(message);
        self
    }

    pub fn error_message(mut self, message: OutboundMessage) -> Self {
        self.error_message = Some(message);
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.next_phase.is_none()
    }
}

impl fmt::Debug for PhaseDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhaseDefinition")
            .field("next_phase", &self.next_phase)
            .field("start_message", &self.start_message)
            .field("error_message", &self.error_message)
            .finish_non_exhaustive()
    }
}

/// A registered command
#[derive(Debug, Clone)]
pub struct CommandDefinition {
    token: String,
    help_text: String,
    scope: Scope,
    admin: bool,
    phases: HashMap<String, PhaseDefinition>,
}

impl CommandDefinition {
    pub fn builder(token: impl Into<String>) -> CommandBuilder {
        CommandBuilder {
            token: token.into(),
            help_text: String::new(),
            scope: Scope::All,
            admin: false,
            phases: HashMap::new(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn help_text(&self) -> &str {
        &self.help_text
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn is_admin(&self) -> bool {
        self.admin
    }

    pub fn phase(&self, name: &str) -> Option<&PhaseDefinition> {
        self.phases.get(name)
    }

    pub fn phase_names(&self) -> impl Iterator<Item = &str> {
        self.phases.keys().map(String::as_str)
    }

    /// The `"token - help"` line used in the help listing
    pub fn help_line(&self) -> String {
        format!("{} - {}", self.token, self.help_text)
    }
}

/// Builder for [`CommandDefinition`]
pub struct CommandBuilder {
    token: String,
    help_text: String,
    scope: Scope,
    admin: bool,
    phases: HashMap<String, PhaseDefinition>,
}

impl CommandBuilder {
    pub fn help(mut self, text: impl Into<String>) -> Self {
        self.help_text = text.into();
        self
    }

    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Hide the command from the help listing
    pub fn admin(mut self) -> Self {
        self.admin = true;
        self
    }

    pub fn phase(mut self, name: impl Into<String>, phase: PhaseDefinition) -> Self {
        self.phases.insert(name.into(), phase);
        self
    }

    /// Validate the phase table and produce the definition
    pub fn build(self) -> Result<CommandDefinition> {
        let token = self.token.trim().to_lowercase();

        if token.is_empty() {
            return Err(PhaseBotError::InvalidCommand("command token is empty".to_string()));
        }

        if token.chars().any(char::is_whitespace) || token.contains('@') {
            return Err(PhaseBotError::InvalidCommand(format!(
                "command token '{}' may not contain whitespace or '@'",
                token
            )));
        }

        if token == START_COMMAND || token == HELP_COMMAND {
            return Err(PhaseBotError::InvalidCommand(format!(
                "{} is answered by the engine and cannot be registered",
                token
            )));
        }

        if !self.phases.contains_key(START_PHASE) {
            return Err(PhaseBotError::InvalidCommand(format!(
                "{} has no '{}' phase",
                token, START_PHASE
            )));
        }

        for (name, phase) in &self.phases {
            if let Some(next) = &phase.next_phase {
                if !self.phases.contains_key(next) {
                    return Err(PhaseBotError::InvalidCommand(format!(
                        "{}: phase '{}' continues to undefined phase '{}'",
                        token, name, next
                    )));
                }
            }
        }

        Ok(CommandDefinition {
            token,
            help_text: self.help_text,
            scope: self.scope,
            admin: self.admin,
            phases: self.phases,
        })
    }
}
