//! Menu rendering state machine.
//!
//! Presents one unit of content (text, optional background image, optional
//! inline keyboard) either by editing an existing message in place or by
//! sending a new one. Edits walk a fixed fallback chain:
//!
//! - replace the media with a fresh photo (caption = text)
//! - replace only the caption, keeping the current photo
//! - replace the text body
//!
//! Surface errors are logged and folded into the outcome; they never reach the
//! caller of [`MenuRenderer::render`].

use std::{path::PathBuf, sync::Arc};

use tracing::Level;

use crate::{
    domain::{ChatId, ExistingMessage},
    errors::Error,
    images::{ImageLookup, ImageStore},
    logging::EventLog,
    messaging::{
        port::ChatSurface,
        types::{InlineKeyboard, Interaction, TextFormat},
    },
    Result,
};

/// What to show. Immutable per render call.
#[derive(Clone, Debug, PartialEq)]
pub struct MenuContent {
    pub text: String,
    /// Logical file name under the image root.
    pub image: Option<String>,
    pub controls: Option<InlineKeyboard>,
    pub format: TextFormat,
    pub suppress_link_preview: bool,
}

impl MenuContent {
    /// HTML text with link previews suppressed.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image: None,
            controls: None,
            format: TextFormat::Html,
            suppress_link_preview: true,
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn with_controls(mut self, controls: InlineKeyboard) -> Self {
        self.controls = Some(controls);
        self
    }

    pub fn with_format(mut self, format: TextFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_link_preview(mut self, enabled: bool) -> Self {
        self.suppress_link_preview = !enabled;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderTarget {
    Existing(ExistingMessage),
    New(ChatId),
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderRequest {
    pub target: RenderTarget,
    pub content: MenuContent,
}

/// Whether the presented message ended up with an image background.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Fresh photo or preserved existing photo.
    Image,
    /// Plain text, or nothing at all.
    TextOnly,
}

impl RenderOutcome {
    pub fn image_used(self) -> bool {
        matches!(self, RenderOutcome::Image)
    }
}

/// Edit chain states.
#[derive(Debug)]
enum Stage {
    Media(PathBuf),
    Caption,
    Text,
}

/// Result of one stage.
#[derive(Debug)]
enum Attempt {
    Success(RenderOutcome),
    /// Continue with the given stage.
    SoftFail(Stage),
    /// Chain exhausted by a real failure.
    HardFail(Error),
}

#[derive(Clone)]
pub struct MenuRenderer {
    surface: Arc<dyn ChatSurface>,
    images: ImageStore,
    log: Arc<dyn EventLog>,
}

impl MenuRenderer {
    pub fn new(surface: Arc<dyn ChatSurface>, images: ImageStore, log: Arc<dyn EventLog>) -> Self {
        Self {
            surface,
            images,
            log,
        }
    }

    pub fn surface(&self) -> &Arc<dyn ChatSurface> {
        &self.surface
    }

    /// Render and fold every failure into the outcome.
    pub async fn render(&self, req: &RenderRequest) -> RenderOutcome {
        let res = match req.target {
            RenderTarget::Existing(target) => self.try_update(target, &req.content).await,
            RenderTarget::New(chat_id) => self.try_send(chat_id, &req.content).await,
        };
        res.unwrap_or(RenderOutcome::TextOnly)
    }

    /// Callbacks edit the message they came from; fresh messages get a new reply.
    pub async fn render_interaction(
        &self,
        interaction: &Interaction,
        content: &MenuContent,
    ) -> RenderOutcome {
        let target = match interaction {
            Interaction::Callback(cb) => match cb.message {
                Some(msg) => RenderTarget::Existing(msg),
                None => {
                    self.log.record(
                        Level::ERROR,
                        &format!(
                            "menu render requested for callback {} without a target message",
                            cb.callback_id
                        ),
                    );
                    return RenderOutcome::TextOnly;
                }
            },
            Interaction::Message(m) => RenderTarget::New(m.chat_id),
        };

        self.render(&RenderRequest {
            target,
            content: content.clone(),
        })
        .await
    }

    /// Update an existing message in place.
    ///
    /// Returns `Err` only when the last stage of the chain failed for real
    /// (anything but a "not modified" no-op); the error has already been logged.
    pub async fn try_update(
        &self,
        target: ExistingMessage,
        content: &MenuContent,
    ) -> Result<RenderOutcome> {
        let mut stage = match self.lookup_image(content) {
            Some(path) => Stage::Media(path),
            None if target.has_photo => Stage::Caption,
            None => Stage::Text,
        };

        loop {
            let attempt = match stage {
                Stage::Media(path) => self.replace_media(target, &path, content).await,
                Stage::Caption => self.replace_caption(target, content).await,
                Stage::Text => self.replace_text(target, content).await,
            };
            match attempt {
                Attempt::Success(outcome) => return Ok(outcome),
                Attempt::SoftFail(next) => stage = next,
                Attempt::HardFail(err) => return Err(err),
            }
        }
    }

    /// Post a new message: photo with caption if possible, otherwise text.
    ///
    /// Exactly one text fallback, whatever made the photo fail.
    pub async fn try_send(&self, chat_id: ChatId, content: &MenuContent) -> Result<RenderOutcome> {
        if let Some(path) = self.lookup_image(content) {
            match self
                .surface
                .send_photo(
                    chat_id,
                    &path,
                    &content.text,
                    content.format,
                    content.controls.as_ref(),
                )
                .await
            {
                Ok(_) => return Ok(RenderOutcome::Image),
                Err(e) => self.log.record(
                    Level::WARN,
                    &format!("Failed to send menu photo {}: {e}", path.display()),
                ),
            }
        }

        match self
            .surface
            .send_text(
                chat_id,
                &content.text,
                content.format,
                content.controls.as_ref(),
                content.suppress_link_preview,
            )
            .await
        {
            Ok(_) => Ok(RenderOutcome::TextOnly),
            Err(e) => {
                self.log
                    .record(Level::ERROR, &format!("Failed to send menu text: {e}"));
                Err(e)
            }
        }
    }

    fn lookup_image(&self, content: &MenuContent) -> Option<PathBuf> {
        let name = content.image.as_deref()?;
        match self.images.resolve(name) {
            ImageLookup::Found(path) => Some(path),
            ImageLookup::Missing(path) => {
                self.log.record(
                    Level::WARN,
                    &format!("Menu image file not found: {}", path.display()),
                );
                None
            }
            ImageLookup::Invalid(name) => {
                self.log.record(
                    Level::WARN,
                    &format!("Menu image name {name:?} is outside the image root"),
                );
                None
            }
        }
    }

    async fn replace_media(
        &self,
        target: ExistingMessage,
        path: &std::path::Path,
        content: &MenuContent,
    ) -> Attempt {
        let res = self
            .surface
            .edit_message_media(
                target.msg,
                path,
                &content.text,
                content.format,
                content.controls.as_ref(),
            )
            .await;

        match res {
            Ok(()) => Attempt::Success(RenderOutcome::Image),
            Err(e) if e.is_rejection() => {
                self.log.record(
                    Level::WARN,
                    &format!("Failed to edit media for menu using {}: {e}", path.display()),
                );
                if target.has_photo {
                    Attempt::SoftFail(Stage::Caption)
                } else {
                    Attempt::SoftFail(Stage::Text)
                }
            }
            Err(e) => {
                self.log.record(
                    Level::ERROR,
                    &format!(
                        "Unexpected error while editing menu media {}: {e}",
                        path.display()
                    ),
                );
                Attempt::SoftFail(Stage::Text)
            }
        }
    }

    async fn replace_caption(&self, target: ExistingMessage, content: &MenuContent) -> Attempt {
        let res = self
            .surface
            .edit_message_caption(
                target.msg,
                &content.text,
                content.format,
                content.controls.as_ref(),
            )
            .await;

        match res {
            Ok(()) => Attempt::Success(RenderOutcome::Image),
            Err(e) if e.is_not_modified() => {
                self.log.record(
                    Level::DEBUG,
                    &format!(
                        "Menu caption not modified for message {}",
                        target.msg.message_id.0
                    ),
                );
                Attempt::SoftFail(Stage::Text)
            }
            Err(e) if e.is_rejection() => {
                self.log.record(
                    Level::WARN,
                    &format!("Failed to edit existing menu caption: {e}"),
                );
                Attempt::SoftFail(Stage::Text)
            }
            Err(e) => {
                self.log.record(
                    Level::ERROR,
                    &format!("Unexpected error while editing existing menu caption: {e}"),
                );
                Attempt::SoftFail(Stage::Text)
            }
        }
    }

    async fn replace_text(&self, target: ExistingMessage, content: &MenuContent) -> Attempt {
        let res = self
            .surface
            .edit_message_text(
                target.msg,
                &content.text,
                content.format,
                content.controls.as_ref(),
                content.suppress_link_preview,
            )
            .await;

        match res {
            Ok(()) => Attempt::Success(RenderOutcome::TextOnly),
            Err(e) if e.is_not_modified() => {
                self.log.record(
                    Level::DEBUG,
                    &format!(
                        "Menu text not modified for message {}",
                        target.msg.message_id.0
                    ),
                );
                Attempt::Success(RenderOutcome::TextOnly)
            }
            Err(e) => {
                self.log
                    .record(Level::ERROR, &format!("Failed to edit menu text: {e}"));
                Attempt::HardFail(e)
            }
        }
    }
}
