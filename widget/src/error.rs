//! Widget-specific errors.

use supportchat_protocol::ProtocolError;

#[derive(Debug, thiserror::Error)]
pub enum WidgetError {
    /// The host page never answered the configuration request.
    #[error("host page did not provide a configuration")]
    ConfigTimeout,
    #[error("cross-frame channel closed")]
    ChannelClosed,
    #[error("realtime channel unavailable: {0}")]
    Realtime(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("backend request failed: {0}")]
    Api(String),
    #[error("file upload failed: {0}")]
    Upload(String),
    #[error("storage failure: {0}")]
    Storage(anyhow::Error),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl From<anyhow::Error> for WidgetError {
    fn from(err: anyhow::Error) -> Self {
        Self::Storage(err)
    }
}

pub type Result<T> = std::result::Result<T, WidgetError>;
