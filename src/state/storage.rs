//! Context storage implementation
//!
//! In-memory, per-user storage of conversation contexts. Each user owns one
//! slot holding at most one context; the slot is an async mutex, so every
//! transition step for a user runs while holding it and steps for the same
//! user never interleave. Contexts are lost on restart.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Duration;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info};

use super::context::{ContextSummary, ConversationContext};
use crate::commands::CommandDefinition;
use crate::dispatch::message::InboundMessage;
use crate::messaging::Messenger;

type Slot = Arc<AsyncMutex<Option<ConversationContext>>>;

/// Process-wide map from user id to that user's conversation
#[derive(Clone, Default)]
pub struct ContextStore {
    slots: Arc<Mutex<HashMap<i64, Slot>>>,
    ttl: Option<Duration>,
}

impl ContextStore {
    /// Create a store whose contexts never expire
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose contexts expire after `ttl` without activity
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            slots: Arc::default(),
            ttl: Some(ttl),
        }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    fn slot(&self, user_id: i64) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(slots.entry(user_id).or_default())
    }

    /// Take exclusive access to a user's slot, waiting for any step already
    /// running for that user
    pub async fn lock(&self, user_id: i64) -> UserSlot {
        let guard = self.slot(user_id).lock_owned().await;
        self.user_slot(user_id, guard)
    }

    /// Like [`lock`](Self::lock), but `None` when the user owns no slot.
    /// Never adds an entry for the user.
    pub async fn lock_existing(&self, user_id: i64) -> Option<UserSlot> {
        let slot = {
            let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
            slots.get(&user_id).cloned()?
        };
        let guard = slot.lock_owned().await;
        Some(self.user_slot(user_id, guard))
    }

    fn user_slot(
        &self,
        user_id: i64,
        guard: OwnedMutexGuard<Option<ConversationContext>>,
    ) -> UserSlot {
        UserSlot {
            user_id,
            ttl: self.ttl,
            slots: Arc::clone(&self.slots),
            guard,
        }
    }

    /// Snapshot of a user's context, if the slot is free and holds one
    pub fn snapshot(&self, user_id: i64) -> Option<ContextSummary> {
        let slot = {
            let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
            slots.get(&user_id).cloned()?
        };
        let guard = slot.try_lock().ok()?;
        guard.as_ref().map(ConversationContext::summary)
    }

    /// Users that currently own a slot
    pub fn active_users(&self) -> Vec<i64> {
        let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.slots.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop expired contexts. Slots that are busy are skipped and checked
    /// again on the next run.
    pub fn cleanup_expired(&self) -> usize {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        let mut cleaned = 0;

        slots.retain(|user_id, slot| {
            let Ok(mut guard) = slot.try_lock() else {
                return true;
            };
            if guard.as_ref().is_some_and(ConversationContext::is_expired) {
                debug!(user_id = *user_id, "Dropping expired context");
                *guard = None;
                cleaned += 1;
            }
            // a handle held elsewhere is about to lock this slot
            guard.is_some() || Arc::strong_count(slot) > 1
        });

        if cleaned > 0 {
            info!("Cleaned up {} expired contexts", cleaned);
        }
        cleaned
    }
}

/// Exclusive handle on one user's slot
pub struct UserSlot {
    user_id: i64,
    ttl: Option<Duration>,
    slots: Arc<Mutex<HashMap<i64, Slot>>>,
    guard: OwnedMutexGuard<Option<ConversationContext>>,
}

impl UserSlot {
    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    /// The user's context, ended or not. Expired contexts are dropped and
    /// reported as absent.
    pub fn get_or_none(&mut self) -> Option<&mut ConversationContext> {
        if self.guard.as_ref().is_some_and(ConversationContext::is_expired) {
            debug!(user_id = self.user_id, "Context expired");
            *self.guard = None;
        }
        self.guard.as_mut()
    }

    /// Start a fresh context at `"start"`, replacing whatever the user had
    pub fn create(
        &mut self,
        command: Arc<CommandDefinition>,
        message: InboundMessage,
        messenger: Arc<dyn Messenger>,
    ) -> &mut ConversationContext {
        if let Some(previous) = self.guard.as_ref() {
            debug!(
                user_id = self.user_id,
                previous_command = previous.command().token(),
                previous_phase = %previous.phase(),
                "Replacing existing context"
            );
        }

        let mut ctx = ConversationContext::new(command, message, messenger);
        if let Some(ttl) = self.ttl {
            ctx.set_ttl(ttl);
        }
        self.guard.insert(ctx)
    }

    /// Route a follow-up message into the existing context, keeping its
    /// phase and variables
    pub fn update_message(&mut self, message: InboundMessage) -> Option<&mut ConversationContext> {
        let ctx = self.get_or_none()?;
        ctx.replace_message(message);
        Some(ctx)
    }
}

impl Drop for UserSlot {
    /// Release the map entry of a slot left empty, unless another task is
    /// already waiting on it
    fn drop(&mut self) {
        if self.guard.is_some() {
            return;
        }
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        let idle = slots
            .get(&self.user_id)
            .is_some_and(|slot| Arc::strong_count(slot) <= 2);
        if idle {
            slots.remove(&self.user_id);
        }
    }
}
