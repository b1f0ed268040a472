//! Elysia terminal client
//!
//! Lines typed on stdin are chat turns. Commands:
//!
//! | Command | Effect |
//! |---------|--------|
//! | `/mic` | start/stop recording a voice turn |
//! | `/camera` | toggle periodic camera capture |
//! | `/voice <file.wav>` | send a prerecorded voice turn |
//! | `/say <text>` | speak text without a chat turn |
//! | `/reconnect` | reopen the realtime channel |
//! | `/quit` | end the session |
//!
//! The camera reads `ELYSIA_FRAME_FILE` on every tick: either a JPEG or a
//! `data:image/...;base64,` URL.

use anyhow::Context;
use async_trait::async_trait;
use elysia_client::{ClientResult, Coordinator, CoordinatorHandle, FrameSource, HttpBackend};
use elysia_core::{AudioClip, ClientConfig, Frame, SessionState};
use elysia_voice::{Recorder, SpeechPlayer};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Camera stand-in backed by a file on disk.
struct FileFrameSource {
    path: Option<PathBuf>,
}

#[async_trait]
impl FrameSource for FileFrameSource {
    async fn snapshot(&self) -> ClientResult<Option<Frame>> {
        let Some(path) = &self.path else {
            return Ok(None);
        };
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Frame file unreadable");
                return Ok(None);
            }
        };
        if bytes.starts_with(b"data:") {
            let url = String::from_utf8_lossy(&bytes);
            return Ok(Some(Frame::from_data_url(url.trim())?));
        }
        Ok(Some(Frame::jpeg(bytes)))
    }
}

#[cfg(feature = "device")]
fn audio_devices() -> (Box<dyn Recorder>, Arc<dyn SpeechPlayer>) {
    (
        Box::new(elysia_voice::CpalRecorder::new()),
        Arc::new(elysia_voice::RodioPlayer::new()),
    )
}

#[cfg(not(feature = "device"))]
fn audio_devices() -> (Box<dyn Recorder>, Arc<dyn SpeechPlayer>) {
    tracing::info!("Built without `device`: recording and playback are placeholders");
    (
        Box::new(elysia_voice::PlaceholderRecorder::new()),
        Arc::new(elysia_voice::SilentPlayer::new()),
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[elysia-terminal] .env not loaded: {} (using system environment)", e);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ClientConfig::load().context("load client config")?;
    tracing::info!(api = %config.api_base, ws = %config.ws_base, "Elysia terminal starting");

    let backend = Arc::new(HttpBackend::new(config.clone())?);
    let (recorder, player) = audio_devices();
    let frames = Arc::new(FileFrameSource {
        path: std::env::var("ELYSIA_FRAME_FILE").ok().map(PathBuf::from),
    });

    let (coordinator, handle) = Coordinator::new(config, backend, recorder, player, frames);
    let session = tokio::spawn(coordinator.run());
    let printer = tokio::spawn(print_updates(handle.subscribe()));

    read_commands(&handle).await?;

    handle.shutdown()?;
    let final_state = session.await??;
    printer.abort();
    println!("({} messages this session)", final_state.messages().len());
    Ok(())
}

async fn read_commands(handle: &CoordinatorHandle) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (command, arg) = line.split_once(' ').unwrap_or((line, ""));
        match command {
            "/quit" | "/exit" => break,
            "/mic" => handle.toggle_listening()?,
            "/camera" => handle.toggle_camera()?,
            "/reconnect" => handle.reconnect()?,
            "/say" => handle.speak(arg)?,
            "/voice" => match tokio::fs::read(arg.trim()).await {
                Ok(bytes) => handle.voice_input(AudioClip::wav(bytes))?,
                Err(e) => eprintln!("cannot read {}: {}", arg.trim(), e),
            },
            _ => handle.send_text(line)?,
        }
    }
    Ok(())
}

async fn print_updates(mut rx: watch::Receiver<SessionState>) {
    let mut printed = 0;
    let mut last = rx.borrow().clone();
    loop {
        let state = rx.borrow_and_update().clone();
        for message in &state.messages()[printed.min(state.messages().len())..] {
            let who = if message.is_user() { "you" } else { "elysia" };
            let at = message.timestamp.as_deref().unwrap_or("--:--");
            println!("[{at}] {who}: {}", message.content);
        }
        printed = state.messages().len();

        if state.is_typing() && !last.is_typing() {
            println!("  … elysia is typing");
        }
        if state.is_listening() != last.is_listening() {
            println!("  mic {}", if state.is_listening() { "on" } else { "off" });
        }
        if state.camera_active() != last.camera_active() {
            println!("  camera {}", if state.camera_active() { "on" } else { "off" });
        }
        if state.emotion() != last.emotion() {
            let avatar = state.avatar();
            println!("  mood: {} ({})", state.emotion(), avatar.style.color);
        }
        if state.vision_analysis() != last.vision_analysis() {
            if let Some(analysis) = state.vision_analysis() {
                println!("  sees: {analysis}");
            }
        }
        last = state;

        if rx.changed().await.is_err() {
            return;
        }
    }
}
