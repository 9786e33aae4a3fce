use std::path::Path;

use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef},
    messaging::types::{InlineKeyboard, TextFormat},
    Result,
};

/// Chat-surface port.
///
/// Implementations map a refusal by the surface (bad request, content not
/// modified, wrong message type) to `Error::Rejected` carrying the surface's
/// reason, and everything else (network, timeouts) to `Error::External`.
#[async_trait]
pub trait ChatSurface: Send + Sync {
    /// Replace the message's media with a local photo, `caption` attached.
    async fn edit_message_media(
        &self,
        msg: MessageRef,
        photo: &Path,
        caption: &str,
        format: TextFormat,
        controls: Option<&InlineKeyboard>,
    ) -> Result<()>;

    /// Replace the caption while keeping the current media.
    async fn edit_message_caption(
        &self,
        msg: MessageRef,
        caption: &str,
        format: TextFormat,
        controls: Option<&InlineKeyboard>,
    ) -> Result<()>;

    async fn edit_message_text(
        &self,
        msg: MessageRef,
        text: &str,
        format: TextFormat,
        controls: Option<&InlineKeyboard>,
        suppress_link_preview: bool,
    ) -> Result<()>;

    async fn send_photo(
        &self,
        chat_id: ChatId,
        photo: &Path,
        caption: &str,
        format: TextFormat,
        controls: Option<&InlineKeyboard>,
    ) -> Result<MessageRef>;

    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        format: TextFormat,
        controls: Option<&InlineKeyboard>,
        suppress_link_preview: bool,
    ) -> Result<MessageRef>;

    /// Acknowledge a callback interaction, optionally with a notice or alert.
    async fn answer_interaction(
        &self,
        callback_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> Result<()>;
}
