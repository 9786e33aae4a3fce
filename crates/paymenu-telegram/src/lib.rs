//! Telegram adapter (teloxide).
//!
//! This crate implements the `paymenu-core` ChatSurface over the Telegram Bot API.

use std::path::Path;

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{
        InlineKeyboardButton, InlineKeyboardMarkup, InputFile, InputMedia, InputMediaPhoto,
        ParseMode,
    },
    RequestError,
};

use tokio::time::sleep;

pub mod handlers;
pub mod router;

use paymenu_core::{
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    messaging::{
        port::ChatSurface,
        types::{ButtonAction, InlineButton, InlineKeyboard, TextFormat},
    },
    Result,
};

#[derive(Clone)]
pub struct TelegramSurface {
    bot: Bot,
}

impl TelegramSurface {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    pub fn bot(&self) -> Bot {
        self.bot.clone()
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn tg_msg_id(message_id: MessageId) -> teloxide::types::MessageId {
        teloxide::types::MessageId(message_id.0)
    }

    fn parse_mode(format: TextFormat) -> Option<ParseMode> {
        match format {
            TextFormat::Plain => None,
            TextFormat::Html => Some(ParseMode::Html),
        }
    }

    /// API errors are refusals by Telegram; everything else is transport.
    fn map_err(e: RequestError) -> Error {
        match e {
            RequestError::Api(api) => Error::Rejected(api.to_string()),
            other => Error::External(format!("telegram error: {other}")),
        }
    }

    fn markup(kb: &InlineKeyboard) -> Result<InlineKeyboardMarkup> {
        let rows = kb
            .rows
            .iter()
            .map(|row| row.iter().map(Self::button).collect::<Result<Vec<_>>>())
            .collect::<Result<Vec<_>>>()?;
        Ok(InlineKeyboardMarkup::new(rows))
    }

    fn button(b: &InlineButton) -> Result<InlineKeyboardButton> {
        match &b.action {
            ButtonAction::Callback(data) => {
                Ok(InlineKeyboardButton::callback(b.label.clone(), data.clone()))
            }
            ButtonAction::Url(raw) => {
                let url = url::Url::parse(raw)
                    .map_err(|e| Error::External(format!("invalid button url {raw:?}: {e}")))?;
                Ok(InlineKeyboardButton::url(b.label.clone(), url))
            }
        }
    }

    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, RequestError>>,
        Fut::IntoFuture: Send,
    {
        // Flood control only: a 429 is waited out once. Menu-level fallbacks
        // are the renderer's business.
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) => match e {
                    RequestError::RetryAfter(d) if attempts < MAX_RETRIES => {
                        attempts += 1;
                        sleep(d).await;
                        continue;
                    }
                    other => return Err(Self::map_err(other)),
                },
            }
        }
    }
}

#[async_trait]
impl ChatSurface for TelegramSurface {
    async fn edit_message_media(
        &self,
        msg: MessageRef,
        photo: &Path,
        caption: &str,
        format: TextFormat,
        controls: Option<&InlineKeyboard>,
    ) -> Result<()> {
        let markup = controls.map(Self::markup).transpose()?;
        self.with_retry(|| {
            let mut media =
                InputMediaPhoto::new(InputFile::file(photo.to_path_buf())).caption(caption);
            if let Some(pm) = Self::parse_mode(format) {
                media = media.parse_mode(pm);
            }
            let mut req = self.bot.edit_message_media(
                Self::tg_chat(msg.chat_id),
                Self::tg_msg_id(msg.message_id),
                InputMedia::Photo(media),
            );
            if let Some(m) = &markup {
                req = req.reply_markup(m.clone());
            }
            req
        })
        .await?;
        Ok(())
    }

    async fn edit_message_caption(
        &self,
        msg: MessageRef,
        caption: &str,
        format: TextFormat,
        controls: Option<&InlineKeyboard>,
    ) -> Result<()> {
        let markup = controls.map(Self::markup).transpose()?;
        self.with_retry(|| {
            let mut req = self
                .bot
                .edit_message_caption(Self::tg_chat(msg.chat_id), Self::tg_msg_id(msg.message_id))
                .caption(caption);
            if let Some(pm) = Self::parse_mode(format) {
                req = req.parse_mode(pm);
            }
            if let Some(m) = &markup {
                req = req.reply_markup(m.clone());
            }
            req
        })
        .await?;
        Ok(())
    }

    async fn edit_message_text(
        &self,
        msg: MessageRef,
        text: &str,
        format: TextFormat,
        controls: Option<&InlineKeyboard>,
        suppress_link_preview: bool,
    ) -> Result<()> {
        let markup = controls.map(Self::markup).transpose()?;
        self.with_retry(|| {
            let mut req = self
                .bot
                .edit_message_text(
                    Self::tg_chat(msg.chat_id),
                    Self::tg_msg_id(msg.message_id),
                    text,
                )
                .disable_web_page_preview(suppress_link_preview);
            if let Some(pm) = Self::parse_mode(format) {
                req = req.parse_mode(pm);
            }
            if let Some(m) = &markup {
                req = req.reply_markup(m.clone());
            }
            req
        })
        .await?;
        Ok(())
    }

    async fn send_photo(
        &self,
        chat_id: ChatId,
        photo: &Path,
        caption: &str,
        format: TextFormat,
        controls: Option<&InlineKeyboard>,
    ) -> Result<MessageRef> {
        let markup = controls.map(Self::markup).transpose()?;
        let sent = self
            .with_retry(|| {
                let mut req = self
                    .bot
                    .send_photo(Self::tg_chat(chat_id), InputFile::file(photo.to_path_buf()))
                    .caption(caption);
                if let Some(pm) = Self::parse_mode(format) {
                    req = req.parse_mode(pm);
                }
                if let Some(m) = &markup {
                    req = req.reply_markup(m.clone());
                }
                req
            })
            .await?;

        Ok(MessageRef {
            chat_id,
            message_id: MessageId(sent.id.0),
        })
    }

    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        format: TextFormat,
        controls: Option<&InlineKeyboard>,
        suppress_link_preview: bool,
    ) -> Result<MessageRef> {
        let markup = controls.map(Self::markup).transpose()?;
        let sent = self
            .with_retry(|| {
                let mut req = self
                    .bot
                    .send_message(Self::tg_chat(chat_id), text)
                    .disable_web_page_preview(suppress_link_preview);
                if let Some(pm) = Self::parse_mode(format) {
                    req = req.parse_mode(pm);
                }
                if let Some(m) = &markup {
                    req = req.reply_markup(m.clone());
                }
                req
            })
            .await?;

        Ok(MessageRef {
            chat_id,
            message_id: MessageId(sent.id.0),
        })
    }

    async fn answer_interaction(
        &self,
        callback_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> Result<()> {
        self.with_retry(|| {
            let mut req = self.bot.answer_callback_query(callback_id.to_string());
            if let Some(t) = text {
                req = req.text(t).show_alert(show_alert);
            }
            req
        })
        .await?;
        Ok(())
    }
}
