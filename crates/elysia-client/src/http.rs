//! **Request client**: REST calls for speech, transcription and vision.
//!
//! | Call | Endpoint | Body |
//! |------|----------|------|
//! | synthesize | `GET /api/chat/tts?text=` | audio bytes, 204 = nothing to play |
//! | voice_chat | `POST /api/chat/voice` | multipart `audio` |
//! | vision_chat | `POST /api/chat/vision-chat` | multipart `message`, `file` |
//! | analyze_frame | `POST /api/vision/analyze` | multipart `image` |

use crate::backend::Backend;
use crate::error::{ClientError, ClientResult};
use async_trait::async_trait;
use elysia_core::{AudioClip, ClientConfig, Frame, FrameAnalysis, VisionChatReply, VoiceReply};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::debug;

const TTS_PATH: &str = "/api/chat/tts";
const VOICE_PATH: &str = "/api/chat/voice";
const VISION_CHAT_PATH: &str = "/api/chat/vision-chat";
const ANALYZE_PATH: &str = "/api/vision/analyze";

/// [`Backend`] over HTTP with a shared connection pool and timeout.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    config: ClientConfig,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self { config, client })
    }

    async fn post_form<T: DeserializeOwned>(&self, path: &str, form: Form) -> ClientResult<T> {
        let url = self.config.endpoint(path);
        debug!(%url, "POST");
        let res = self.client.post(&url).multipart(form).send().await?;
        decode_json(res).await
    }
}

fn file_part(bytes: &[u8], file_name: &'static str, mime: &str) -> ClientResult<Part> {
    Ok(Part::bytes(bytes.to_vec())
        .file_name(file_name)
        .mime_str(mime)?)
}

async fn decode_json<T: DeserializeOwned>(res: reqwest::Response) -> ClientResult<T> {
    let status = res.status();
    let body = res.text().await?;
    if !status.is_success() {
        return Err(ClientError::Status {
            status: status.as_u16(),
            body,
        });
    }
    serde_json::from_str(&body).map_err(|e| ClientError::Malformed(e.to_string()))
}

#[async_trait]
impl Backend for HttpBackend {
    async fn synthesize(&self, text: &str) -> ClientResult<Vec<u8>> {
        let url = self.config.endpoint(TTS_PATH);
        let res = self
            .client
            .get(&url)
            .query(&[("text", text)])
            .send()
            .await?;
        let status = res.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(Vec::new());
        }
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(res.bytes().await?.to_vec())
    }

    async fn voice_chat(&self, clip: &AudioClip) -> ClientResult<VoiceReply> {
        let form = Form::new().part("audio", file_part(&clip.bytes, "voice.wav", &clip.mime)?);
        self.post_form(VOICE_PATH, form).await
    }

    async fn vision_chat(&self, text: &str, frame: &Frame) -> ClientResult<VisionChatReply> {
        let form = Form::new()
            .text("message", text.to_string())
            .part("file", file_part(&frame.bytes, "vision.jpg", &frame.mime)?);
        self.post_form(VISION_CHAT_PATH, form).await
    }

    async fn analyze_frame(&self, frame: &Frame) -> ClientResult<FrameAnalysis> {
        let form = Form::new().part("image", file_part(&frame.bytes, "frame.jpg", &frame.mime)?);
        self.post_form(ANALYZE_PATH, form).await
    }
}
