use std::{collections::HashMap, path::Path, sync::Arc, time::Duration};

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use crate::{
    domain::{ChatId, MessageRef},
    messaging::{
        port::ChatSurface,
        types::{InlineKeyboard, TextFormat},
    },
    Result,
};

#[derive(Clone, Copy, Debug)]
pub struct ThrottleConfig {
    /// Minimum spacing between *any* Telegram API calls (global flood control).
    pub global_min_interval: Duration,
    /// Minimum spacing between calls per chat.
    pub per_chat_min_interval: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            global_min_interval: Duration::from_millis(40), // ~25/sec
            per_chat_min_interval: Duration::from_millis(350),
        }
    }
}

#[derive(Debug)]
struct IntervalLimiter {
    interval: Duration,
    next: Instant,
}

impl IntervalLimiter {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            next: Instant::now(),
        }
    }

    /// Reserve the next slot and return the wait duration required before executing.
    fn reserve(&mut self) -> Duration {
        let now = Instant::now();
        let start = if now >= self.next { now } else { self.next };
        self.next = start + self.interval;
        start.saturating_duration_since(now)
    }
}

/// Next free slot per chat. Chats whose slot has already passed carry no
/// state, so the map only holds chats active within the last interval.
#[derive(Debug)]
struct ChatSlots {
    interval: Duration,
    next: HashMap<i64, Instant>,
}

impl ChatSlots {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            next: HashMap::new(),
        }
    }

    fn reserve(&mut self, chat_id: i64) -> Duration {
        let now = Instant::now();
        self.next.retain(|_, next| *next > now);

        let start = self.next.get(&chat_id).copied().unwrap_or(now);
        let next = start + self.interval;
        if next > now {
            self.next.insert(chat_id, next);
        }
        start.saturating_duration_since(now)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.next.len()
    }
}

/// ChatSurface decorator that rate-limits outbound calls.
///
/// Menu navigation produces bursts of edits when users tap quickly; spacing
/// them out keeps us under Telegram's flood limits. Best-effort only.
pub struct ThrottledSurface {
    inner: Arc<dyn ChatSurface>,
    global: Mutex<IntervalLimiter>,
    per_chat: Mutex<ChatSlots>,
}

impl ThrottledSurface {
    pub fn new(inner: Arc<dyn ChatSurface>, cfg: ThrottleConfig) -> Self {
        Self {
            inner,
            global: Mutex::new(IntervalLimiter::new(cfg.global_min_interval)),
            per_chat: Mutex::new(ChatSlots::new(cfg.per_chat_min_interval)),
        }
    }

    async fn throttle_chat(&self, chat_id: ChatId) {
        let global_wait = { self.global.lock().await.reserve() };
        let chat_wait = { self.per_chat.lock().await.reserve(chat_id.0) };

        let wait = global_wait.max(chat_wait);
        if wait > Duration::ZERO {
            sleep(wait).await;
        }
    }

    async fn throttle_global(&self) {
        let wait = { self.global.lock().await.reserve() };
        if wait > Duration::ZERO {
            sleep(wait).await;
        }
    }
}

#[async_trait::async_trait]
impl ChatSurface for ThrottledSurface {
    async fn edit_message_media(
        &self,
        msg: MessageRef,
        photo: &Path,
        caption: &str,
        format: TextFormat,
        controls: Option<&InlineKeyboard>,
    ) -> Result<()> {
        self.throttle_chat(msg.chat_id).await;
        self.inner
            .edit_message_media(msg, photo, caption, format, controls)
            .await
    }

    async fn edit_message_caption(
        &self,
        msg: MessageRef,
        caption: &str,
        format: TextFormat,
        controls: Option<&InlineKeyboard>,
    ) -> Result<()> {
        self.throttle_chat(msg.chat_id).await;
        self.inner
            .edit_message_caption(msg, caption, format, controls)
            .await
    }

    async fn edit_message_text(
        &self,
        msg: MessageRef,
        text: &str,
        format: TextFormat,
        controls: Option<&InlineKeyboard>,
        suppress_link_preview: bool,
    ) -> Result<()> {
        self.throttle_chat(msg.chat_id).await;
        self.inner
            .edit_message_text(msg, text, format, controls, suppress_link_preview)
            .await
    }

    async fn send_photo(
        &self,
        chat_id: ChatId,
        photo: &Path,
        caption: &str,
        format: TextFormat,
        controls: Option<&InlineKeyboard>,
    ) -> Result<MessageRef> {
        self.throttle_chat(chat_id).await;
        self.inner
            .send_photo(chat_id, photo, caption, format, controls)
            .await
    }

    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        format: TextFormat,
        controls: Option<&InlineKeyboard>,
        suppress_link_preview: bool,
    ) -> Result<MessageRef> {
        self.throttle_chat(chat_id).await;
        self.inner
            .send_text(chat_id, text, format, controls, suppress_link_preview)
            .await
    }

    async fn answer_interaction(
        &self,
        callback_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> Result<()> {
        // No chat_id available here; apply global throttling only.
        self.throttle_global().await;
        self.inner
            .answer_interaction(callback_id, text, show_alert)
            .await
    }
}
