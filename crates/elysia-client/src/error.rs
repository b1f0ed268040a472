//! Error types for the coordinator, channel and request client

use elysia_core::CoreError;
use elysia_voice::VoiceError;
use thiserror::Error;

/// Result type alias for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Transport, payload and device failures seen by the client.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Channel error: {0}")]
    Channel(String),

    #[error("Realtime channel is closed")]
    ChannelClosed,

    #[error("Device error: {0}")]
    Device(#[from] VoiceError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Coordinator has shut down")]
    CoordinatorGone,
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        ClientError::Channel(err.to_string())
    }
}
