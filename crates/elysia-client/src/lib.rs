//! # Elysia Client - session coordination over a realtime channel and REST
//!
//! [`Coordinator`] owns one companion session. It feeds user input, channel
//! traffic, capture ticks and request completions through the pure
//! [`elysia_core::SessionMachine`] and runs the resulting effects:
//!
//! - chat turns over the WebSocket [`channel`]
//! - speech, transcription and vision calls through a [`Backend`]
//! - periodic camera snapshots through [`FrameCapture`]
//! - recording and playback through `elysia-voice`
//!
//! ```no_run
//! use std::sync::Arc;
//! use elysia_client::{Coordinator, HttpBackend, StaticFrameSource};
//! use elysia_core::ClientConfig;
//! use elysia_voice::{PlaceholderRecorder, SilentPlayer};
//!
//! # async fn demo() -> elysia_client::ClientResult<()> {
//! let config = ClientConfig::load()?;
//! let backend = Arc::new(HttpBackend::new(config.clone())?);
//! let (coordinator, handle) = Coordinator::new(
//!     config,
//!     backend,
//!     Box::new(PlaceholderRecorder::new()),
//!     Arc::new(SilentPlayer::new()),
//!     Arc::new(StaticFrameSource::empty()),
//! );
//! let session = tokio::spawn(coordinator.run());
//! handle.send_text("Hello")?;
//! handle.shutdown()?;
//! let _final_state = session.await.ok();
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod capture;
pub mod channel;
pub mod coordinator;
pub mod error;
pub mod http;
pub mod recording;

pub use backend::Backend;
pub use capture::{FrameCapture, FrameSource, StaticFrameSource};
pub use channel::ChannelHandle;
pub use coordinator::{Coordinator, CoordinatorHandle};
pub use error::{ClientError, ClientResult};
pub use http::HttpBackend;
pub use recording::{RecordingCommand, RecordingWorker};
