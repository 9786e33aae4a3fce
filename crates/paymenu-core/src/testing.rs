//! In-memory fakes for the chat surface and the payment gateway.

use std::{
    collections::{HashMap, VecDeque},
    path::{Path, PathBuf},
    sync::Mutex,
};

use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageId, MessageRef, UserId},
    errors::Error,
    messaging::{
        port::ChatSurface,
        types::{InlineKeyboard, TextFormat},
    },
    payments::{
        gateway::{InvoiceRequest, PaymentGateway},
        request::SaleMode,
    },
    Result,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Op {
    EditMedia,
    EditCaption,
    EditText,
    SendPhoto,
    SendText,
    Answer,
}

/// Scripted response for the next call of an op. Unscripted calls succeed.
#[derive(Clone, Copy, Debug)]
pub enum Reply {
    Ok,
    Reject(&'static str),
    Transport,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Call {
    pub op: Op,
    pub text: Option<String>,
    pub photo: Option<PathBuf>,
    pub controls: Option<InlineKeyboard>,
    pub suppress_link_preview: Option<bool>,
    pub show_alert: bool,
}

impl Call {
    fn new(op: Op) -> Self {
        Self {
            op,
            text: None,
            photo: None,
            controls: None,
            suppress_link_preview: None,
            show_alert: false,
        }
    }
}

#[derive(Default)]
pub struct FakeSurface {
    script: Mutex<HashMap<Op, VecDeque<Reply>>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, op: Op, replies: &[Reply]) {
        self.script
            .lock()
            .unwrap()
            .entry(op)
            .or_default()
            .extend(replies.iter().copied());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn ops(&self) -> Vec<Op> {
        self.calls().into_iter().map(|c| c.op).collect()
    }

    pub fn count(&self, op: Op) -> usize {
        self.calls().iter().filter(|c| c.op == op).count()
    }

    fn reply(&self, call: Call) -> Result<()> {
        let op = call.op;
        self.calls.lock().unwrap().push(call);
        let next = self
            .script
            .lock()
            .unwrap()
            .get_mut(&op)
            .and_then(|q| q.pop_front())
            .unwrap_or(Reply::Ok);
        match next {
            Reply::Ok => Ok(()),
            Reply::Reject(reason) => Err(Error::Rejected(reason.to_string())),
            Reply::Transport => Err(Error::External("connection reset".to_string())),
        }
    }

    fn sent(chat_id: ChatId) -> MessageRef {
        MessageRef {
            chat_id,
            message_id: MessageId(1000),
        }
    }
}

#[async_trait]
impl ChatSurface for FakeSurface {
    async fn edit_message_media(
        &self,
        _msg: MessageRef,
        photo: &Path,
        caption: &str,
        _format: TextFormat,
        controls: Option<&InlineKeyboard>,
    ) -> Result<()> {
        self.reply(Call {
            text: Some(caption.to_string()),
            photo: Some(photo.to_path_buf()),
            controls: controls.cloned(),
            ..Call::new(Op::EditMedia)
        })
    }

    async fn edit_message_caption(
        &self,
        _msg: MessageRef,
        caption: &str,
        _format: TextFormat,
        controls: Option<&InlineKeyboard>,
    ) -> Result<()> {
        self.reply(Call {
            text: Some(caption.to_string()),
            controls: controls.cloned(),
            ..Call::new(Op::EditCaption)
        })
    }

    async fn edit_message_text(
        &self,
        _msg: MessageRef,
        text: &str,
        _format: TextFormat,
        controls: Option<&InlineKeyboard>,
        suppress_link_preview: bool,
    ) -> Result<()> {
        self.reply(Call {
            text: Some(text.to_string()),
            controls: controls.cloned(),
            suppress_link_preview: Some(suppress_link_preview),
            ..Call::new(Op::EditText)
        })
    }

    async fn send_photo(
        &self,
        chat_id: ChatId,
        photo: &Path,
        caption: &str,
        _format: TextFormat,
        controls: Option<&InlineKeyboard>,
    ) -> Result<MessageRef> {
        self.reply(Call {
            text: Some(caption.to_string()),
            photo: Some(photo.to_path_buf()),
            controls: controls.cloned(),
            ..Call::new(Op::SendPhoto)
        })?;
        Ok(Self::sent(chat_id))
    }

    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        _format: TextFormat,
        controls: Option<&InlineKeyboard>,
        suppress_link_preview: bool,
    ) -> Result<MessageRef> {
        self.reply(Call {
            text: Some(text.to_string()),
            controls: controls.cloned(),
            suppress_link_preview: Some(suppress_link_preview),
            ..Call::new(Op::SendText)
        })?;
        Ok(Self::sent(chat_id))
    }

    async fn answer_interaction(
        &self,
        _callback_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> Result<()> {
        self.reply(Call {
            text: text.map(str::to_string),
            show_alert,
            ..Call::new(Op::Answer)
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RecordedInvoice {
    pub user_id: UserId,
    pub quantity: f64,
    pub amount: f64,
    pub description: String,
    pub sale_mode: SaleMode,
}

pub struct FakeGateway {
    pub configured: bool,
    pub url: Option<String>,
    invoices: Mutex<Vec<RecordedInvoice>>,
}

impl FakeGateway {
    pub fn returning(url: Option<&str>) -> Self {
        Self {
            configured: true,
            url: url.map(str::to_string),
            invoices: Mutex::new(Vec::new()),
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::returning(Some("https://pay.example/never"))
        }
    }

    pub fn invoices(&self) -> Vec<RecordedInvoice> {
        self.invoices.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    fn configured(&self) -> bool {
        self.configured
    }

    async fn create_invoice(&self, req: &InvoiceRequest) -> Option<String> {
        self.invoices.lock().unwrap().push(RecordedInvoice {
            user_id: req.user_id,
            quantity: req.quantity,
            amount: req.amount,
            description: req.description.clone(),
            sale_mode: req.sale_mode,
        });
        self.url.clone()
    }
}

/// Temporary image root, removed on drop.
pub struct TempImages {
    pub root: PathBuf,
}

impl TempImages {
    pub fn new(tag: &str) -> Self {
        let root =
            std::env::temp_dir().join(format!("paymenu-{tag}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&root);
        std::fs::create_dir_all(&root).unwrap();
        Self { root }
    }

    pub fn with_file(self, name: &str) -> Self {
        std::fs::write(self.root.join(name), b"\x89PNG").unwrap();
        self
    }
}

impl Drop for TempImages {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.root);
    }
}
