//! Dispatch engine
//!
//! Classifies each inbound message as a bootstrap request, a new command
//! invocation or a follow-up to the sender's conversation, and drives the
//! conversation one transition step at a time.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::fallback::{Fallback, NoopFallback};
use super::message::{command_token, tokenize, InboundMessage};
use crate::commands::{
    CommandDefinition, CommandRegistry, Scope, HELP_COMMAND, START_COMMAND, START_PHASE,
};
use crate::config::MessagesConfig;
use crate::messaging::{Messenger, OutboundMessage};
use crate::state::{ContextStore, ConversationContext, PhaseState};
use crate::utils::errors::{PhaseBotError, Result};
use crate::utils::logging;

/// How an inbound message was routed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routing {
    /// Answered with the static help text
    Help,
    /// Started a new conversation
    Command(StepOutcome),
    /// Continued the sender's conversation
    Continued(StepOutcome),
    /// No conversation to continue; handed to the fallback
    Fallback,
    /// Not text, or free text in a group chat
    Ignored,
}

/// Result of one transition step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The conversation had already ended
    Inert,
    /// `init` ran for the start phase
    Initialized,
    /// Validation failed; the phase is unchanged
    Rejected,
    Advanced { to: String },
    Ended,
}

/// The command dispatcher and phase-transition driver
pub struct DispatchEngine {
    registry: Arc<CommandRegistry>,
    store: ContextStore,
    messenger: Arc<dyn Messenger>,
    fallback: Arc<dyn Fallback>,
    messages: MessagesConfig,
}

impl DispatchEngine {
    pub fn new(
        registry: Arc<CommandRegistry>,
        store: ContextStore,
        messenger: Arc<dyn Messenger>,
        messages: MessagesConfig,
    ) -> Self {
        Self {
            registry,
            store,
            messenger,
            fallback: Arc::new(NoopFallback),
            messages,
        }
    }

    /// Replace the handler for free text without a conversation
    pub fn with_fallback(mut self, fallback: Arc<dyn Fallback>) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn store(&self) -> &ContextStore {
        &self.store
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn messenger(&self) -> &Arc<dyn Messenger> {
        &self.messenger
    }

    /// Route one inbound message
    pub async fn handle_message(&self, msg: InboundMessage) -> Result<Routing> {
        let Some(text) = msg.text.as_deref() else {
            return Ok(Routing::Ignored);
        };
        let tokens = tokenize(text);
        let Some(first) = tokens.first() else {
            return Ok(Routing::Ignored);
        };
        let token = command_token(first);
        let user_id = msg.user_id();

        let routing = match token.as_str() {
            START_COMMAND => {
                self.send_help(user_id, false).await?;
                Routing::Help
            }
            HELP_COMMAND => {
                self.send_help(user_id, true).await?;
                Routing::Help
            }
            _ => match self.registry.lookup(&token) {
                Some(command) => {
                    Routing::Command(self.invoke(command, msg.clone(), &tokens).await?)
                }
                None => self.follow_up(msg.clone(), &tokens).await?,
            },
        };

        logging::log_inbound(user_id, msg.chat.id, &token, &format!("{:?}", routing));
        Ok(routing)
    }

    /// Help header, optionally followed by the command listing
    pub fn help_text(&self, with_commands: bool) -> String {
        if with_commands {
            format!(
                "{}\n\n{}",
                self.messages.help_header,
                self.registry.list_help().join("\n")
            )
        } else {
            self.messages.help_header.clone()
        }
    }

    async fn send_help(&self, user_id: i64, with_commands: bool) -> Result<()> {
        let help = OutboundMessage::text(self.help_text(with_commands));
        self.messenger.deliver(user_id, &help).await
    }

    async fn invoke(
        &self,
        command: Arc<CommandDefinition>,
        msg: InboundMessage,
        tokens: &[String],
    ) -> Result<StepOutcome> {
        let user_id = msg.user_id();

        if command.scope() == Scope::Private && !msg.is_private_chat() {
            warn!(
                user_id = user_id,
                chat_id = msg.chat.id,
                command = command.token(),
                "Private command used outside a private chat"
            );
            return Err(PhaseBotError::ScopeViolation {
                command: command.token().to_string(),
            });
        }

        let mut slot = self.store.lock(user_id).await;
        let ctx = slot.create(command, msg.clone(), Arc::clone(&self.messenger));
        info!(
            user_id = user_id,
            command = ctx.command().token(),
            context_id = %ctx.id(),
            "Conversation started"
        );

        self.step(ctx, &msg, tokens).await
    }

    async fn follow_up(&self, msg: InboundMessage, tokens: &[String]) -> Result<Routing> {
        let user_id = msg.user_id();
        let Some(mut slot) = self.store.lock_existing(user_id).await else {
            return self.fall_back(&msg, tokens).await;
        };
        if !slot.get_or_none().is_some_and(|ctx| !ctx.has_ended()) {
            drop(slot);
            return self.fall_back(&msg, tokens).await;
        }

        if !msg.is_private_chat() {
            debug!(
                user_id = user_id,
                chat_id = msg.chat.id,
                "Ignoring free text in group chat"
            );
            return Ok(Routing::Ignored);
        }

        match slot.update_message(msg.clone()) {
            Some(ctx) => Ok(Routing::Continued(self.step(ctx, &msg, tokens).await?)),
            None => self.fall_back(&msg, tokens).await,
        }
    }

    async fn fall_back(&self, msg: &InboundMessage, tokens: &[String]) -> Result<Routing> {
        self.fallback
            .handle(msg, tokens, self.messenger.as_ref())
            .await?;
        Ok(Routing::Fallback)
    }

    /// Run one transition step on `ctx`
    pub async fn step(
        &self,
        ctx: &mut ConversationContext,
        msg: &InboundMessage,
        tokens: &[String],
    ) -> Result<StepOutcome> {
        let phase_name = match ctx.phase() {
            PhaseState::Ended => return Ok(StepOutcome::Inert),
            PhaseState::Active(name) => name.clone(),
        };
        let command = Arc::clone(ctx.command());
        let phase = command
            .phase(&phase_name)
            .ok_or_else(|| unknown_phase(&command, &phase_name))?;

        if phase_name == START_PHASE && !ctx.mark_started() {
            debug!(user_id = ctx.user_id(), command = command.token(), "Running init");
            let checkpoint = ctx.checkpoint();
            if let Err(source) = phase.handler.init(ctx, msg, tokens).await {
                ctx.rollback(checkpoint);
                return Err(handler_failure(&command, &phase_name, source));
            }
            return Ok(StepOutcome::Initialized);
        }

        if !phase.handler.validate_input(ctx, msg, tokens) {
            debug!(
                user_id = ctx.user_id(),
                command = command.token(),
                phase = %phase_name,
                "Input rejected"
            );
            if let Some(error_message) = &phase.error_message {
                self.send_quietly(ctx, error_message, &phase_name).await;
            }
            return Ok(StepOutcome::Rejected);
        }

        let checkpoint = ctx.checkpoint();
        if let Err(source) = phase.handler.on_valid_input(ctx, msg, tokens).await {
            ctx.rollback(checkpoint);
            return Err(handler_failure(&command, &phase_name, source));
        }

        // the handler may have moved or ended the conversation itself
        let current = match ctx.phase() {
            PhaseState::Ended => return Ok(StepOutcome::Ended),
            PhaseState::Active(name) => name.clone(),
        };
        let current_phase = command
            .phase(&current)
            .ok_or_else(|| unknown_phase(&command, &current))?;

        match current_phase.next_phase.clone() {
            Some(next) => {
                ctx.set_phase(&next)?;
                logging::log_transition(ctx.user_id(), command.token(), &current, &next);
                let start_message = command.phase(&next).and_then(|p| p.start_message.as_ref());
                if let Some(start_message) = start_message {
                    self.send_quietly(ctx, start_message, &next).await;
                }
                Ok(StepOutcome::Advanced { to: next })
            }
            None => {
                ctx.end();
                info!(
                    user_id = ctx.user_id(),
                    command = command.token(),
                    context_id = %ctx.id(),
                    "Conversation ended"
                );
                Ok(StepOutcome::Ended)
            }
        }
    }

    /// Send without letting a delivery failure affect the transition
    async fn send_quietly(
        &self,
        ctx: &ConversationContext,
        message: &OutboundMessage,
        phase: &str,
    ) {
        if let Err(e) = ctx.send_message(message).await {
            logging::log_send_failure(ctx.user_id(), ctx.command().token(), phase, &e);
        }
    }
}

fn unknown_phase(command: &CommandDefinition, phase: &str) -> PhaseBotError {
    PhaseBotError::UnknownPhase {
        command: command.token().to_string(),
        phase: phase.to_string(),
    }
}

fn handler_failure(
    command: &CommandDefinition,
    phase: &str,
    source: anyhow::Error,
) -> PhaseBotError {
    PhaseBotError::HandlerFailure {
        command: command.token().to_string(),
        phase: phase.to_string(),
        source,
    }
}
