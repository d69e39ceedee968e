//! Conversation context management
//!
//! This module handles a user's conversation context: which command they
//! are in, which phase of it, and the command's scratch variables.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::commands::{CommandDefinition, Scope, START_PHASE};
use crate::dispatch::message::InboundMessage;
use crate::messaging::{Messenger, OutboundMessage};
use crate::utils::errors::{PhaseBotError, Result};

/// Position of a conversation in its command's phase table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhaseState {
    Active(String),
    Ended,
}

impl PhaseState {
    pub fn name(&self) -> Option<&str> {
        match self {
            PhaseState::Active(name) => Some(name),
            PhaseState::Ended => None,
        }
    }
}

impl fmt::Display for PhaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhaseState::Active(name) => write!(f, "{}", name),
            PhaseState::Ended => write!(f, "<ended>"),
        }
    }
}

/// One user's progress through one command
#[derive(Clone)]
pub struct ConversationContext {
    id: Uuid,
    user_id: i64,
    command: Arc<CommandDefinition>,
    message: InboundMessage,
    phase: PhaseState,
    started: bool,
    variables: HashMap<String, serde_json::Value>,
    messenger: Arc<dyn Messenger>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
}

impl ConversationContext {
    /// Create a context at the `"start"` phase of `command`
    pub fn new(
        command: Arc<CommandDefinition>,
        message: InboundMessage,
        messenger: Arc<dyn Messenger>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: message.user_id(),
            command,
            message,
            phase: PhaseState::Active(START_PHASE.to_string()),
            started: false,
            variables: HashMap::new(),
            messenger,
            created_at: now,
            updated_at: now,
            expires_at: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn command(&self) -> &Arc<CommandDefinition> {
        &self.command
    }

    /// The most recent message routed to this conversation
    pub fn message(&self) -> &InboundMessage {
        &self.message
    }

    pub fn phase(&self) -> &PhaseState {
        &self.phase
    }

    pub fn is_at(&self, phase: &str) -> bool {
        self.phase.name() == Some(phase)
    }

    pub fn has_ended(&self) -> bool {
        self.phase == PhaseState::Ended
    }

    pub fn is_private_chat(&self) -> bool {
        self.message.is_private_chat()
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Move to another phase of the same command
    pub fn set_phase(&mut self, phase: &str) -> Result<()> {
        if self.command.phase(phase).is_none() {
            return Err(PhaseBotError::UnknownPhase {
                command: self.command.token().to_string(),
                phase: phase.to_string(),
            });
        }
        self.phase = PhaseState::Active(phase.to_string());
        self.touch();
        Ok(())
    }

    /// End the conversation and drop its variables
    pub fn end(&mut self) {
        self.phase = PhaseState::Ended;
        self.variables.clear();
        self.touch();
    }

    pub(crate) fn replace_message(&mut self, message: InboundMessage) {
        self.message = message;
        self.touch();
    }

    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            phase: self.phase.clone(),
            variables: self.variables.clone(),
        }
    }

    /// Return to a checkpoint taken before a failed handler ran
    pub(crate) fn rollback(&mut self, checkpoint: Checkpoint) {
        self.phase = checkpoint.phase;
        self.variables = checkpoint.variables;
    }

    /// Record that `init` has run; returns whether it had run before
    pub(crate) fn mark_started(&mut self) -> bool {
        std::mem::replace(&mut self.started, true)
    }

    pub fn has_started(&self) -> bool {
        self.started
    }

    /// Private commands answer the sender, others answer the chat
    pub fn reply_target(&self) -> i64 {
        match self.command.scope() {
            Scope::Private => self.message.from.id,
            Scope::All => self.message.chat.id,
        }
    }

    /// Send a message to this conversation's reply target
    pub async fn send_message(&self, message: &OutboundMessage) -> Result<()> {
        message.validate()?;
        self.messenger.deliver(self.reply_target(), message).await
    }

    /// Store a variable for later phases
    pub fn store_variable<T: Serialize>(&mut self, key: &str, value: T) -> Result<()> {
        let json_value = serde_json::to_value(value)?;
        self.variables.insert(key.to_string(), json_value);
        self.touch();
        Ok(())
    }

    /// Fetch a variable stored by an earlier phase
    pub fn fetch_variable<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Result<Option<T>> {
        match self.variables.get(key) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.fetch_variable::<String>(key).unwrap_or(None)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.fetch_variable::<i64>(key).unwrap_or(None)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.fetch_variable::<bool>(key).unwrap_or(None)
    }

    pub fn remove_variable(&mut self, key: &str) -> Option<serde_json::Value> {
        self.touch();
        self.variables.remove(key)
    }

    pub fn forget_variables(&mut self) {
        self.variables.clear();
        self.touch();
    }

    pub fn variables(&self) -> &HashMap<String, serde_json::Value> {
        &self.variables
    }

    /// Expire `ttl` after the last update
    pub fn set_ttl(&mut self, ttl: Duration) {
        self.expires_at = self.updated_at.checked_add_signed(ttl);
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.map_or(false, |expires_at| Utc::now() > expires_at)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    fn touch(&mut self) {
        let now = Utc::now();
        if let Some(expires_at) = self.expires_at {
            // keep the same idle window, measured from the new update
            let ttl = expires_at - self.updated_at;
            self.expires_at = now.checked_add_signed(ttl);
        }
        self.updated_at = now;
    }

    /// Create a summary of the context for logging
    pub fn summary(&self) -> ContextSummary {
        ContextSummary {
            id: self.id,
            user_id: self.user_id,
            command: self.command.token().to_string(),
            phase: self.phase.clone(),
            started: self.started,
            variables: self.variables.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            expires_at: self.expires_at,
        }
    }
}

impl fmt::Debug for ConversationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversationContext")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("command", &self.command.token())
            .field("phase", &self.phase)
            .field("started", &self.started)
            .field("variables", &self.variables)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Phase and variables of a context before a step
pub(crate) struct Checkpoint {
    phase: PhaseState,
    variables: HashMap<String, serde_json::Value>,
}

/// Context summary for logging and inspection
#[derive(Debug, Clone, Serialize)]
pub struct ContextSummary {
    pub id: Uuid,
    pub user_id: i64,
    pub command: String,
    pub phase: PhaseState,
    pub started: bool,
    pub variables: HashMap<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}
