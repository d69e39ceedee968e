//! Handling for messages that belong to no conversation

use async_trait::async_trait;
use tracing::debug;

use super::message::InboundMessage;
use crate::messaging::{Messenger, OutboundMessage};
use crate::utils::errors::Result;

/// Receives free text from users without an active conversation
#[async_trait]
pub trait Fallback: Send + Sync {
    async fn handle(
        &self,
        msg: &InboundMessage,
        tokens: &[String],
        messenger: &dyn Messenger,
    ) -> Result<()>;
}

/// Drops the message
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopFallback;

#[async_trait]
impl Fallback for NoopFallback {
    async fn handle(
        &self,
        msg: &InboundMessage,
        _tokens: &[String],
        _messenger: &dyn Messenger,
    ) -> Result<()> {
        debug!(user_id = msg.user_id(), "No conversation for message, ignoring");
        Ok(())
    }
}

/// Suggests using a command, in private chats only
#[derive(Debug, Clone)]
pub struct HintFallback {
    hint: OutboundMessage,
}

impl HintFallback {
    pub fn new(hint: OutboundMessage) -> Self {
        Self { hint }
    }
}

#[async_trait]
impl Fallback for HintFallback {
    async fn handle(
        &self,
        msg: &InboundMessage,
        _tokens: &[String],
        messenger: &dyn Messenger,
    ) -> Result<()> {
        if msg.is_private_chat() {
            messenger.deliver(msg.chat.id, &self.hint).await?;
        }
        Ok(())
    }
}
