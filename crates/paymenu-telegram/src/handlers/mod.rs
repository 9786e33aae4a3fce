//! Telegram update handlers.
//!
//! Each handler translates the teloxide update into a core `Interaction` and
//! hands it to the renderer or the payment flow.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{CallbackQuery, Message},
};

use paymenu_core::{
    domain::{ChatId, ExistingMessage, MessageId, MessageRef, UserId},
    messaging::types::{CallbackInteraction, IncomingMessage},
};

use crate::router::AppState;

mod callback;
mod commands;

pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    callback::handle_callback(bot, q, state).await
}

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    if let Some(text) = msg.text() {
        if text.starts_with('/') {
            return commands::handle_command(bot, msg, state).await;
        }
    }
    Ok(())
}

pub(crate) fn existing_message(msg: &Message) -> ExistingMessage {
    ExistingMessage {
        msg: MessageRef {
            chat_id: ChatId(msg.chat.id.0),
            message_id: MessageId(msg.id.0),
        },
        has_photo: msg.photo().is_some(),
    }
}

pub(crate) fn callback_interaction(q: &CallbackQuery) -> CallbackInteraction {
    CallbackInteraction {
        callback_id: q.id.clone(),
        user_id: UserId(q.from.id.0 as i64),
        language_code: q.from.language_code.clone(),
        data: q.data.clone().unwrap_or_default(),
        message: q.message.as_ref().map(existing_message),
    }
}

pub(crate) fn incoming_message(msg: &Message) -> IncomingMessage {
    IncomingMessage {
        chat_id: ChatId(msg.chat.id.0),
        user_id: msg.from().map(|u| UserId(u.id.0 as i64)),
        language_code: msg.from().and_then(|u| u.language_code.clone()),
        text: msg.text().map(str::to_string),
    }
}
