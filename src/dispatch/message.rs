//! Inbound message model and tokenizing

use serde::{Deserialize, Serialize};

/// Who sent a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    pub id: i64,
}

/// Kind of chat a message arrived in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatKind {
    Private,
    Group,
    Supergroup,
    Channel,
}

/// The chat a message arrived in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatInfo {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: ChatKind,
}

/// Transport-independent view of an inbound message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub from: Sender,
    pub chat: ChatInfo,
    pub text: Option<String>,
}

impl InboundMessage {
    pub fn new(user_id: i64, chat_id: i64, kind: ChatKind, text: Option<String>) -> Self {
        Self {
            from: Sender { id: user_id },
            chat: ChatInfo { id: chat_id, kind },
            text,
        }
    }

    /// Text message in a one-on-one chat with the sender
    pub fn private(user_id: i64, text: impl Into<String>) -> Self {
        Self::new(user_id, user_id, ChatKind::Private, Some(text.into()))
    }

    /// Text message in a group chat
    pub fn group(user_id: i64, chat_id: i64, text: impl Into<String>) -> Self {
        Self::new(user_id, chat_id, ChatKind::Group, Some(text.into()))
    }

    pub fn is_private_chat(&self) -> bool {
        self.chat.kind == ChatKind::Private
    }

    pub fn user_id(&self) -> i64 {
        self.from.id
    }
}

/// Split text into whitespace separated tokens
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

/// Normalize the first token for command lookup: drop any `@botname`
/// suffix and lower-case it
pub fn command_token(first: &str) -> String {
    let bare = match first.split_once('@') {
        Some((head, _)) => head,
        None => first,
    };
    bare.to_lowercase()
}
