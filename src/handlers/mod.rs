//! Bot handlers module
//!
//! This module contains the teloxide endpoints that feed the dispatch engine.

pub mod messages;

pub use messages::{handle_message, inbound_from_telegram, process_inbound, HandlerResult};
