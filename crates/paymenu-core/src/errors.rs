/// Core error type.
///
/// Adapter crates map their specific errors into this type so the renderer and
/// the payment flow can tell a surface rejection apart from a transport failure.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The chat surface understood the request and refused it.
    #[error("rejected by surface: {0}")]
    Rejected(String),

    #[error("invalid payload: {0}")]
    Payload(String),

    #[error("external error: {0}")]
    External(String),
}

impl Error {
    pub fn is_rejection(&self) -> bool {
        matches!(self, Error::Rejected(_))
    }

    /// Surface rejected an edit whose content is identical to the current one.
    pub fn is_not_modified(&self) -> bool {
        match self {
            Error::Rejected(reason) => reason.to_lowercase().contains("not modified"),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
