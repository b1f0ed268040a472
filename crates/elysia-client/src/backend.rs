//! **Backend seam**: the request/response calls the coordinator makes.
//!
//! [`crate::HttpBackend`] is the production implementation; tests substitute
//! their own to script replies and failures.

use crate::error::ClientResult;
use async_trait::async_trait;
use elysia_core::{AudioClip, Frame, FrameAnalysis, VisionChatReply, VoiceReply};

#[async_trait]
pub trait Backend: Send + Sync {
    /// Speech audio for `text`. An empty vec means the backend had nothing to play.
    async fn synthesize(&self, text: &str) -> ClientResult<Vec<u8>>;

    /// Transcribe a recording and get the agent's reply to it.
    async fn voice_chat(&self, clip: &AudioClip) -> ClientResult<VoiceReply>;

    /// Chat turn grounded on a camera frame.
    async fn vision_chat(&self, text: &str, frame: &Frame) -> ClientResult<VisionChatReply>;

    /// Describe a camera frame.
    async fn analyze_frame(&self, frame: &Frame) -> ClientResult<FrameAnalysis>;
}
