//! Outbound messaging module
//!
//! This module defines the messages the engine and phases send, the
//! [`Messenger`] seam the transport implements, and the teloxide adapter.

pub mod outbound;
pub mod telegram;

pub use outbound::{Messenger, OutboundMessage, ReplyKeyboard, SendOptions, TextFormat};
pub use telegram::TeloxideMessenger;
