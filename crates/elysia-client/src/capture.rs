//! Periodic camera capture while the camera is active.

use crate::error::ClientResult;
use async_trait::async_trait;
use elysia_core::{Frame, SessionEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, warn};

/// Camera collaborator. `None` means no frame was available this tick.
#[async_trait]
pub trait FrameSource: Send + Sync {
    async fn snapshot(&self) -> ClientResult<Option<Frame>>;
}

/// Source that always hands back the same frame, or nothing.
#[derive(Debug, Clone, Default)]
pub struct StaticFrameSource {
    frame: Option<Frame>,
}

impl StaticFrameSource {
    pub fn new(frame: Frame) -> Self {
        Self { frame: Some(frame) }
    }

    /// A camera that never produces a frame.
    pub fn empty() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FrameSource for StaticFrameSource {
    async fn snapshot(&self) -> ClientResult<Option<Frame>> {
        Ok(self.frame.clone())
    }
}

/// The capture task. At most one runs at a time; starting again is a no-op.
#[derive(Default)]
pub struct FrameCapture {
    task: Option<JoinHandle<()>>,
}

impl FrameCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot immediately, then every `interval`, posting `FrameCaptured`.
    pub fn start(
        &mut self,
        source: Arc<dyn FrameSource>,
        interval: Duration,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) {
        if self.is_running() {
            debug!("Frame capture already running");
            return;
        }
        self.task = Some(tokio::spawn(capture_loop(source, interval, events)));
    }

    /// Abort the task. A snapshot in flight is dropped.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for FrameCapture {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn capture_loop(
    source: Arc<dyn FrameSource>,
    interval: Duration,
    events: mpsc::UnboundedSender<SessionEvent>,
) {
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        match source.snapshot().await {
            Ok(Some(frame)) if !frame.is_empty() => {
                if events.send(SessionEvent::FrameCaptured(frame)).is_err() {
                    return;
                }
            }
            Ok(_) => debug!("No frame available"),
            Err(e) => warn!(error = %e, "Frame capture failed"),
        }
    }
}
