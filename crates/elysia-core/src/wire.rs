//! **Wire codec** for the realtime channel and the REST replies.
//!
//! Inbound channel frames decode into a tagged [`InboundEvent`]; anything that
//! does not match one of the known shapes is a [`CoreError::Malformed`] and the
//! caller drops it.

use crate::emotion::Emotion;
use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};

/// Frames the client sends on the channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundEvent {
    Chat { text: String },
    Heartbeat,
}

impl OutboundEvent {
    pub fn chat(text: impl Into<String>) -> Self {
        OutboundEvent::Chat { text: text.into() }
    }

    pub fn encode(&self) -> CoreResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Frames the backend sends on the channel.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEvent {
    ChatResponse { text: String, emotion: Emotion },
    /// Backend could not produce a reply for the last chat frame.
    Error {
        #[serde(default)]
        text: String,
    },
    /// Reply to [`OutboundEvent::Heartbeat`].
    Pong,
}

impl InboundEvent {
    pub fn decode(raw: &str) -> CoreResult<Self> {
        serde_json::from_str(raw).map_err(|e| CoreError::Malformed(format!("{e} in {raw:.120}")))
    }
}

/// `POST /api/chat/voice` reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceReply {
    pub user_text: String,
    pub response: String,
}

/// `POST /api/chat/vision-chat` reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisionChatReply {
    pub response: String,
    #[serde(default)]
    pub emotion: Option<Emotion>,
}

/// `POST /api/vision/analyze` reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameAnalysis {
    pub analysis: String,
}
