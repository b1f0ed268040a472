//! Shared fixtures: a local chat server and a scripted backend.
#![allow(dead_code)]

use async_trait::async_trait;
use elysia_client::{Backend, ClientError, ClientResult, CoordinatorHandle};
use elysia_core::{
    AudioClip, ChannelStatus, ClientConfig, Frame, FrameAnalysis, SessionState, VisionChatReply,
    VoiceReply,
};
use futures::{SinkExt, StreamExt};
use std::sync::Mutex;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

pub const WAIT: Duration = Duration::from_secs(5);

/// A chat server on localhost. Replies to `chat` with an echo tagged `happy`,
/// to `heartbeat` with `pong`, and hangs up on the chat text `/close`.
pub struct ChatServer {
    pub ws_base: String,
    pub received: mpsc::UnboundedReceiver<String>,
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub async fn spawn_chat_server() -> ChatServer {
    init_tracing();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, received) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let tx = tx.clone();
            tokio::spawn(async move {
                let Ok(ws) = tokio_tungstenite::accept_async(stream).await else {
                    return;
                };
                let (mut write, mut read) = ws.split();
                while let Some(Ok(msg)) = read.next().await {
                    let Message::Text(text) = msg else { continue };
                    let raw = text.as_str().to_owned();
                    let _ = tx.send(raw.clone());
                    let frame: serde_json::Value = serde_json::from_str(&raw).unwrap();
                    let reply = match frame["type"].as_str() {
                        Some("chat") => {
                            let said = frame["text"].as_str().unwrap_or_default();
                            if said == "/close" {
                                let _ = write.send(Message::Close(None)).await;
                                return;
                            }
                            serde_json::json!({
                                "type": "chat_response",
                                "text": format!("echo: {said}"),
                                "emotion": "happy",
                            })
                        }
                        Some("heartbeat") => serde_json::json!({"type": "pong"}),
                        _ => continue,
                    };
                    if write.send(Message::Text(reply.to_string().into())).await.is_err() {
                        return;
                    }
                }
            });
        }
    });

    ChatServer {
        ws_base: format!("ws://{addr}"),
        received,
    }
}

/// A `ws://` origin where nothing is listening.
pub async fn dead_ws_base() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("ws://{addr}")
}

pub fn config(ws_base: &str) -> ClientConfig {
    ClientConfig {
        api_base: "http://127.0.0.1:9".to_string(),
        ws_base: ws_base.to_string(),
        frame_interval_ms: 20,
        request_timeout_secs: 2,
        heartbeat_secs: 0,
        ..ClientConfig::default()
    }
}

/// Backend with canned replies. Records the name of every call.
#[derive(Default)]
pub struct ScriptedBackend {
    pub audio: Vec<u8>,
    pub fail_vision_chat: bool,
    pub calls: Mutex<Vec<&'static str>>,
}

impl ScriptedBackend {
    pub fn with_audio(audio: Vec<u8>) -> Self {
        Self {
            audio,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == call).count()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn synthesize(&self, _text: &str) -> ClientResult<Vec<u8>> {
        self.record("synthesize");
        Ok(self.audio.clone())
    }

    async fn voice_chat(&self, clip: &AudioClip) -> ClientResult<VoiceReply> {
        self.record("voice_chat");
        assert!(!clip.is_empty());
        Ok(VoiceReply {
            user_text: "hello there".to_string(),
            response: "Hi! I heard you.".to_string(),
        })
    }

    async fn vision_chat(&self, _text: &str, _frame: &Frame) -> ClientResult<VisionChatReply> {
        self.record("vision_chat");
        if self.fail_vision_chat {
            return Err(ClientError::Status {
                status: 503,
                body: "vision offline".to_string(),
            });
        }
        Ok(VisionChatReply {
            response: "I can see you waving.".to_string(),
            emotion: Some("loving".into()),
        })
    }

    async fn analyze_frame(&self, _frame: &Frame) -> ClientResult<FrameAnalysis> {
        self.record("analyze_frame");
        Ok(FrameAnalysis {
            analysis: "A person at a desk".to_string(),
        })
    }
}

pub async fn wait_state(
    handle: &CoordinatorHandle,
    pred: impl FnMut(&SessionState) -> bool,
) -> SessionState {
    let mut rx = handle.subscribe();
    let state = tokio::time::timeout(WAIT, rx.wait_for(pred))
        .await
        .expect("timed out waiting for session state")
        .expect("coordinator gone");
    state.clone()
}

pub async fn wait_channel(handle: &CoordinatorHandle, status: ChannelStatus) {
    let mut rx = handle.channel_status();
    tokio::time::timeout(WAIT, rx.wait_for(|s| *s == status))
        .await
        .expect("timed out waiting for channel status")
        .expect("coordinator gone");
}
