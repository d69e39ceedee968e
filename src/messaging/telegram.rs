//! Telegram delivery through teloxide

use async_trait::async_trait;
use teloxide::{
    payloads::{SendMessageSetters, SendPhotoSetters},
    prelude::*,
    types::{ChatId, InputFile, KeyboardButton, KeyboardMarkup, ParseMode, ReplyMarkup},
};
use tracing::debug;

use super::outbound::{Messenger, OutboundMessage, ReplyKeyboard, SendOptions, TextFormat};
use crate::utils::errors::Result;

/// [`Messenger`] backed by a teloxide [`Bot`]
#[derive(Clone)]
pub struct TeloxideMessenger {
    bot: Bot,
}

impl TeloxideMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    pub fn bot(&self) -> &Bot {
        &self.bot
    }
}

#[allow(deprecated)]
fn parse_mode(format: TextFormat) -> ParseMode {
    match format {
        TextFormat::Markdown => ParseMode::Markdown,
        TextFormat::MarkdownV2 => ParseMode::MarkdownV2,
        TextFormat::Html => ParseMode::Html,
    }
}

fn keyboard_markup(keyboard: &ReplyKeyboard) -> ReplyMarkup {
    let rows = keyboard
        .rows
        .iter()
        .map(|row| row.iter().map(|label| KeyboardButton::new(label.clone())).collect::<Vec<_>>());

    let mut markup = KeyboardMarkup::new(rows);
    if keyboard.resize {
        markup = markup.resize_keyboard();
    }
    if keyboard.one_time {
        markup = markup.one_time_keyboard();
    }
    ReplyMarkup::Keyboard(markup)
}

impl TeloxideMessenger {
    async fn send_text(&self, chat_id: i64, text: &str, options: &SendOptions) -> Result<()> {
        let mut request = self.bot.send_message(ChatId(chat_id), text);
        if let Some(format) = options.format {
            request = request.parse_mode(parse_mode(format));
        }
        if let Some(keyboard) = &options.keyboard {
            request = request.reply_markup(keyboard_markup(keyboard));
        }
        request.await?;
        Ok(())
    }

    async fn send_photo(
        &self,
        chat_id: i64,
        buffer: &[u8],
        caption: Option<&str>,
        options: &SendOptions,
    ) -> Result<()> {
        let mut request = self
            .bot
            .send_photo(ChatId(chat_id), InputFile::memory(buffer.to_vec()));
        if let Some(caption) = caption {
            request = request.caption(caption);
        }
        if let Some(format) = options.format {
            request = request.parse_mode(parse_mode(format));
        }
        if let Some(keyboard) = &options.keyboard {
            request = request.reply_markup(keyboard_markup(keyboard));
        }
        request.await?;
        Ok(())
    }
}

#[async_trait]
impl Messenger for TeloxideMessenger {
    async fn deliver(&self, chat_id: i64, message: &OutboundMessage) -> Result<()> {
        message.validate()?;

        match message {
            OutboundMessage::Text { text, options } => {
                debug!(chat_id = chat_id, "Sending text message");
                self.send_text(chat_id, text, options).await
            }
            OutboundMessage::Photo {
                buffer,
                caption,
                options,
            } => {
                debug!(chat_id = chat_id, bytes = buffer.len(), "Sending photo");
                self.send_photo(chat_id, buffer, caption.as_deref(), options)
                    .await
            }
        }
    }
}
