use crate::domain::{ChatId, ExistingMessage, UserId};

/// Cross-messenger incoming interaction.
///
/// Telegram-specific fields live in the Telegram adapter.
#[derive(Clone, Debug)]
pub enum Interaction {
    Message(IncomingMessage),
    Callback(CallbackInteraction),
}

impl Interaction {
    pub fn language_code(&self) -> Option<&str> {
        match self {
            Interaction::Message(m) => m.language_code.as_deref(),
            Interaction::Callback(c) => c.language_code.as_deref(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct IncomingMessage {
    pub chat_id: ChatId,
    pub user_id: Option<UserId>,
    pub language_code: Option<String>,
    pub text: Option<String>,
}

/// A button press on an existing message.
#[derive(Clone, Debug)]
pub struct CallbackInteraction {
    pub callback_id: String,
    pub user_id: UserId,
    pub language_code: Option<String>,
    pub data: String,
    /// Absent when the message is too old or inaccessible to the bot.
    pub message: Option<ExistingMessage>,
}

/// How the surface should interpret message text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextFormat {
    Plain,
    #[default]
    Html,
}

/// Inline keyboard attached to a message. Opaque to the renderer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InlineKeyboard {
    pub rows: Vec<Vec<InlineButton>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub action: ButtonAction,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ButtonAction {
    Callback(String),
    Url(String),
}

impl InlineButton {
    pub fn callback(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: ButtonAction::Callback(data.into()),
        }
    }

    pub fn url(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: ButtonAction::Url(url.into()),
        }
    }
}

impl InlineKeyboard {
    pub fn new(rows: Vec<Vec<InlineButton>>) -> Self {
        Self { rows }
    }

    /// Convenience for "one button per row" layouts.
    pub fn one_per_row(buttons: Vec<InlineButton>) -> Self {
        Self {
            rows: buttons.into_iter().map(|b| vec![b]).collect(),
        }
    }
}
