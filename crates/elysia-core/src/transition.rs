//! **Turn transitions**: the coordinator's reaction to every input, with no I/O.
//!
//! Each [`SessionEvent`] is applied to the [`SessionState`] in one step and
//! yields the [`Effect`]s the caller must run. Effects finish by posting another
//! event (a reply, a failure, a playback edge), so a whole turn is a sequence of
//! `handle` calls:
//!
//! ```text
//! TextSubmitted ─► [SendChat] ... ChannelMessage(chat_response) ─► [Speak]
//!               ─► SpeechStarted ... SpeechEnded
//! ```
//!
//! Failures never append messages; they only roll back busy flags.

use crate::media::{AudioClip, Frame};
use crate::message::Message;
use crate::state::SessionState;
use crate::wire::{FrameAnalysis, InboundEvent, VisionChatReply, VoiceReply};
use tracing::{debug, info, warn};

/// Realtime channel lifecycle as seen by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelStatus {
    Connecting,
    Open,
    #[default]
    Closed,
}

/// Everything that can happen to a session: user intents, backend replies,
/// device edges and channel lifecycle.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// User pressed send.
    TextSubmitted(String),
    ListeningToggled,
    CameraToggled,
    /// Periodic camera snapshot.
    FrameCaptured(Frame),
    /// Recorder flushed its artifact.
    VoiceCaptured(AudioClip),
    RecordingFailed(String),
    /// Agent reply to read aloud, outside of a turn.
    SpeakRequested(String),

    ChannelConnecting,
    ChannelOpened,
    ChannelClosed,
    /// Raw text frame from the channel.
    ChannelMessage(String),
    ChatSendFailed(String),

    VisionChatReplied(VisionChatReply),
    VisionChatFailed { text: String, reason: String },
    VoiceReplied(VoiceReply),
    VoiceFailed(String),
    VisionAnalyzed(FrameAnalysis),
    VisionAnalysisFailed(String),

    SpeechStarted,
    SpeechEnded,
    SpeechFailed(String),
}

/// Work the coordinator must perform after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// `{type: "chat", text}` on the channel.
    SendChat { text: String },
    /// One-shot image + text request; falls back to `SendChat` on failure.
    VisionChat { text: String, frame: Frame },
    Transcribe(AudioClip),
    AnalyzeFrame(Frame),
    /// Synthesize and play.
    Speak { text: String },
    StartRecording,
    StopRecording,
    /// Stop an in-flight capture and discard its audio.
    CancelRecording,
    StartCapture,
    StopCapture,
}

/// Owns the [`SessionState`] and the bookkeeping the transitions need.
#[derive(Debug, Clone)]
pub struct SessionMachine {
    state: SessionState,
    latest_frame: Option<Frame>,
    active_playbacks: usize,
    /// Chats written to the channel and still waiting for a reply.
    pending_chats: usize,
    channel: ChannelStatus,
}

impl SessionMachine {
    pub fn new(state: SessionState) -> Self {
        Self {
            state,
            latest_frame: None,
            active_playbacks: 0,
            pending_chats: 0,
            channel: ChannelStatus::Closed,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn into_state(self) -> SessionState {
        self.state
    }

    pub fn channel_status(&self) -> ChannelStatus {
        self.channel
    }

    /// Number of speech playbacks currently running.
    pub fn active_playbacks(&self) -> usize {
        self.active_playbacks
    }

    pub fn latest_frame(&self) -> Option<&Frame> {
        self.latest_frame.as_ref()
    }

    pub fn pending_chats(&self) -> usize {
        self.pending_chats
    }

    /// Apply one event and return the effects to run, in order.
    pub fn handle(&mut self, event: SessionEvent) -> Vec<Effect> {
        match event {
            SessionEvent::TextSubmitted(text) => self.submit_text(text),
            SessionEvent::ListeningToggled => self.toggle_listening(),
            SessionEvent::CameraToggled => self.toggle_camera(),
            SessionEvent::FrameCaptured(frame) => self.frame_captured(frame),
            SessionEvent::VoiceCaptured(clip) => {
                let mut effects = Vec::new();
                if self.state.is_listening() {
                    debug!("Voice input arrived mid-capture, discarding the recording");
                    effects.push(Effect::CancelRecording);
                }
                self.state.set_listening(false);
                self.state.set_typing(true);
                info!(bytes = clip.len(), "🎤 Voice input captured");
                effects.push(Effect::Transcribe(clip));
                effects
            }
            SessionEvent::RecordingFailed(reason) => {
                warn!(%reason, "Recording failed");
                self.state.set_listening(false);
                Vec::new()
            }
            SessionEvent::SpeakRequested(text) => speak(text),

            SessionEvent::ChannelConnecting => {
                self.channel = ChannelStatus::Connecting;
                Vec::new()
            }
            SessionEvent::ChannelOpened => {
                info!("Realtime channel open");
                self.channel = ChannelStatus::Open;
                Vec::new()
            }
            SessionEvent::ChannelClosed => {
                if self.channel != ChannelStatus::Closed {
                    warn!("Realtime channel closed");
                }
                self.channel = ChannelStatus::Closed;
                if self.pending_chats > 0 {
                    warn!(pending = self.pending_chats, "Chat replies lost with the channel");
                    self.pending_chats = 0;
                    self.state.set_typing(false);
                }
                Vec::new()
            }
            SessionEvent::ChannelMessage(raw) => self.channel_message(&raw),
            SessionEvent::ChatSendFailed(reason) => {
                warn!(%reason, "Chat send failed");
                self.pending_chats = self.pending_chats.saturating_sub(1);
                self.state.set_typing(false);
                Vec::new()
            }

            SessionEvent::VisionChatReplied(reply) => {
                if let Some(emotion) = reply.emotion {
                    self.state.set_emotion(emotion);
                }
                self.agent_replied(reply.response)
            }
            SessionEvent::VisionChatFailed { text, reason } => {
                warn!(%reason, "Vision chat failed, falling back to standard chat");
                self.send_chat(text)
            }
            SessionEvent::VoiceReplied(reply) => {
                self.state.append(Message::user(reply.user_text).stamped());
                self.agent_replied(reply.response)
            }
            SessionEvent::VoiceFailed(reason) => {
                warn!(%reason, "Voice processing failed");
                self.state.set_typing(false);
                Vec::new()
            }
            SessionEvent::VisionAnalyzed(analysis) => {
                debug!(chars = analysis.analysis.len(), "Vision analysis updated");
                self.state.set_vision_analysis(Some(analysis.analysis));
                Vec::new()
            }
            SessionEvent::VisionAnalysisFailed(reason) => {
                warn!(%reason, "Vision analysis failed");
                Vec::new()
            }

            SessionEvent::SpeechStarted => {
                self.active_playbacks += 1;
                self.state.set_speaking(true);
                Vec::new()
            }
            SessionEvent::SpeechEnded => {
                self.active_playbacks = self.active_playbacks.saturating_sub(1);
                self.state.set_speaking(self.active_playbacks > 0);
                Vec::new()
            }
            SessionEvent::SpeechFailed(reason) => {
                warn!(%reason, "TTS failed");
                Vec::new()
            }
        }
    }

    fn submit_text(&mut self, text: String) -> Vec<Effect> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        self.state.append(Message::user(text.clone()).stamped());
        self.state.set_typing(true);

        if self.state.camera_active() {
            if let Some(frame) = self.latest_frame.clone() {
                return vec![Effect::VisionChat { text, frame }];
            }
        }
        self.send_chat(text)
    }

    fn send_chat(&mut self, text: String) -> Vec<Effect> {
        if self.channel != ChannelStatus::Open {
            warn!(status = ?self.channel, "Realtime channel not open, chat dropped");
            self.state.set_typing(false);
            return Vec::new();
        }
        self.pending_chats += 1;
        vec![Effect::SendChat { text }]
    }

    fn toggle_listening(&mut self) -> Vec<Effect> {
        let listening = !self.state.is_listening();
        self.state.set_listening(listening);
        if listening {
            vec![Effect::StartRecording]
        } else {
            vec![Effect::StopRecording]
        }
    }

    fn toggle_camera(&mut self) -> Vec<Effect> {
        let active = !self.state.camera_active();
        self.state.set_camera_active(active);
        if active {
            vec![Effect::StartCapture]
        } else {
            self.latest_frame = None;
            vec![Effect::StopCapture]
        }
    }

    fn frame_captured(&mut self, frame: Frame) -> Vec<Effect> {
        if !self.state.camera_active() {
            debug!("Frame arrived with camera off, ignored");
            return Vec::new();
        }
        self.latest_frame = Some(frame.clone());
        vec![Effect::AnalyzeFrame(frame)]
    }

    fn channel_message(&mut self, raw: &str) -> Vec<Effect> {
        match InboundEvent::decode(raw) {
            Ok(InboundEvent::ChatResponse { text, emotion }) => {
                self.pending_chats = self.pending_chats.saturating_sub(1);
                self.state.set_emotion(emotion);
                self.agent_replied(text)
            }
            Ok(InboundEvent::Error { text }) => {
                warn!(%text, "Backend reported a chat error");
                self.pending_chats = self.pending_chats.saturating_sub(1);
                self.state.set_typing(false);
                Vec::new()
            }
            Ok(InboundEvent::Pong) => {
                debug!("Heartbeat acknowledged");
                Vec::new()
            }
            Err(e) => {
                warn!(error = %e, "Dropping malformed channel payload");
                Vec::new()
            }
        }
    }

    fn agent_replied(&mut self, text: String) -> Vec<Effect> {
        self.state.set_typing(false);
        self.state.append(Message::agent(text.clone()).stamped());
        speak(text)
    }
}

fn speak(text: String) -> Vec<Effect> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    vec![Effect::Speak { text }]
}

impl Default for SessionMachine {
    fn default() -> Self {
        Self::new(SessionState::default())
    }
}
