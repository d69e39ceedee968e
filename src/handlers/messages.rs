//! Top-level message handler
//!
//! Converts teloxide messages into [`InboundMessage`]s, runs them through the
//! engine and turns failures into log entries and user notices. Failures
//! never propagate to the teloxide dispatcher.

use std::sync::Arc;

use teloxide::types::Message;
use tracing::{debug, warn};

use crate::config::MessagesConfig;
use crate::dispatch::{ChatKind, DispatchEngine, InboundMessage, Routing};
use crate::messaging::OutboundMessage;
use crate::utils::errors::PhaseBotError;
use crate::utils::logging;

pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Engine view of a teloxide message; `None` for messages without a sender
pub fn inbound_from_telegram(msg: &Message) -> Option<InboundMessage> {
    let from = msg.from.as_ref()?;

    let kind = if msg.chat.is_private() {
        ChatKind::Private
    } else if msg.chat.is_supergroup() {
        ChatKind::Supergroup
    } else if msg.chat.is_group() {
        ChatKind::Group
    } else {
        ChatKind::Channel
    };

    Some(InboundMessage::new(
        from.id.0 as i64,
        msg.chat.id.0,
        kind,
        msg.text().map(str::to_string),
    ))
}

/// teloxide endpoint for message updates
pub async fn handle_message(
    msg: Message,
    engine: Arc<DispatchEngine>,
    messages: Arc<MessagesConfig>,
) -> HandlerResult {
    match inbound_from_telegram(&msg) {
        Some(inbound) => {
            process_inbound(&engine, &messages, inbound).await;
        }
        None => {
            debug!(chat_id = msg.chat.id.0, "Message without sender, ignoring");
        }
    }
    Ok(())
}

/// Run one message through the engine, reporting any failure to the chat
pub async fn process_inbound(
    engine: &DispatchEngine,
    messages: &MessagesConfig,
    inbound: InboundMessage,
) -> Option<Routing> {
    let user_id = inbound.user_id();
    let chat_id = inbound.chat.id;

    match engine.handle_message(inbound).await {
        Ok(routing) => Some(routing),
        Err(error) => {
            logging::log_dispatch_failure(user_id, chat_id, &error);

            if let Some(notice) = failure_notice(messages, &error) {
                if let Err(e) = engine.messenger().deliver(chat_id, &notice).await {
                    warn!(
                        user_id = user_id,
                        chat_id = chat_id,
                        error = %e,
                        "Failed to send failure notice"
                    );
                }
            }
            None
        }
    }
}

fn failure_notice(messages: &MessagesConfig, error: &PhaseBotError) -> Option<OutboundMessage> {
    match error {
        PhaseBotError::ScopeViolation { .. } => {
            Some(OutboundMessage::text(messages.private_command_notice.clone()))
        }
        _ if messages.notify_on_failure => Some(OutboundMessage::text(format!(
            "{}{}",
            messages.failure_prefix, error
        ))),
        _ => None,
    }
}
