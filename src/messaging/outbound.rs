//! Outbound message model
//!
//! Messages a phase or the engine asks the transport to deliver. Rendering
//! hints are carried in [`SendOptions`] and passed to the transport as-is.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::utils::errors::{PhaseBotError, Result};

/// Text rendering mode requested from the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextFormat {
    /// Telegram's legacy Markdown, where `.`, `-` and `!` need no escaping
    Markdown,
    /// Every reserved character must be escaped by the author
    MarkdownV2,
    Html,
}

/// Custom reply keyboard shown under the input field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyKeyboard {
    pub rows: Vec<Vec<String>>,
    pub resize: bool,
    pub one_time: bool,
}

impl ReplyKeyboard {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self {
            rows,
            resize: true,
            one_time: false,
        }
    }
}

/// Transport-specific rendering hints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendOptions {
    pub format: Option<TextFormat>,
    pub keyboard: Option<ReplyKeyboard>,
}

/// A message to deliver through a [`Messenger`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    Text {
        text: String,
        options: SendOptions,
    },
    Photo {
        buffer: Vec<u8>,
        caption: Option<String>,
        options: SendOptions,
    },
}

impl OutboundMessage {
    /// Plain text message
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            options: SendOptions::default(),
        }
    }

    /// Text message with explicit options
    pub fn with_options(text: impl Into<String>, options: SendOptions) -> Self {
        Self::Text {
            text: text.into(),
            options,
        }
    }

    /// Markdown formatted text message
    pub fn markdown(text: impl Into<String>) -> Self {
        Self::with_options(
            text,
            SendOptions {
                format: Some(TextFormat::Markdown),
                keyboard: None,
            },
        )
    }

    /// Markdown text with a resizable, persistent reply keyboard
    pub fn keyboard(text: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        Self::with_options(
            text,
            SendOptions {
                format: Some(TextFormat::Markdown),
                keyboard: Some(ReplyKeyboard::new(rows)),
            },
        )
    }

    /// Photo with an optional caption
    pub fn photo(buffer: Vec<u8>, caption: Option<String>) -> Self {
        Self::Photo {
            buffer,
            caption,
            options: SendOptions::default(),
        }
    }

    pub fn options(&self) -> &SendOptions {
        match self {
            Self::Text { options, .. } | Self::Photo { options, .. } => options,
        }
    }

    /// Reject messages the transport could never deliver
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Text { text, .. } if text.trim().is_empty() => Err(
                PhaseBotError::MalformedOutboundMessage("text message has no text".to_string()),
            ),
            Self::Photo { buffer, .. } if buffer.is_empty() => {
                Err(PhaseBotError::MalformedOutboundMessage(
                    "photo message has no image data".to_string(),
                ))
            }
            _ => Ok(()),
        }
    }
}

/// Outbound side of the transport
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Deliver `message` to the chat or user identified by `chat_id`
    async fn deliver(&self, chat_id: i64, message: &OutboundMessage) -> Result<()>;
}
