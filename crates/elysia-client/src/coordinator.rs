//! **Session coordinator**: the single event loop.
//!
//! ```text
//! CoordinatorHandle ──► event queue ──► SessionMachine::handle ──► effects
//!        ▲                   ▲                    │                   │
//!        │                   └──── completions ◄──┼───── spawned tasks ┘
//!        └──────────── watch<SessionState> ◄──────┘
//! ```
//!
//! Every event runs to completion before the next one is taken. Network calls
//! happen in spawned tasks that post their outcome back to the queue, so
//! replies are applied in arrival order.

use crate::backend::Backend;
use crate::capture::{FrameCapture, FrameSource};
use crate::channel::ChannelHandle;
use crate::error::{ClientError, ClientResult};
use crate::recording::{RecordingCommand, RecordingWorker};
use elysia_core::{
    AudioClip, ChannelStatus, ClientConfig, Effect, Frame, OutboundEvent, SessionEvent,
    SessionMachine, SessionState,
};
use elysia_voice::{Recorder, SpeechPlayer};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

enum Control {
    Reconnect,
    Shutdown,
}

/// Owns the session and every collaborator. Drive it with [`Coordinator::run`].
pub struct Coordinator {
    config: ClientConfig,
    machine: SessionMachine,
    backend: Arc<dyn Backend>,
    recorder: Option<RecordingWorker>,
    recording_tx: mpsc::UnboundedSender<RecordingCommand>,
    player: Arc<dyn SpeechPlayer>,
    frames: Arc<dyn FrameSource>,
    capture: FrameCapture,
    channel: Option<ChannelHandle>,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    control_rx: mpsc::UnboundedReceiver<Control>,
    state_tx: watch::Sender<SessionState>,
    channel_tx: watch::Sender<ChannelStatus>,
}

/// Cheap, cloneable front door to a running [`Coordinator`].
#[derive(Clone)]
pub struct CoordinatorHandle {
    events: mpsc::UnboundedSender<SessionEvent>,
    control: mpsc::UnboundedSender<Control>,
    state: watch::Receiver<SessionState>,
    channel: watch::Receiver<ChannelStatus>,
}

impl Coordinator {
    pub fn new(
        config: ClientConfig,
        backend: Arc<dyn Backend>,
        recorder: Box<dyn Recorder>,
        player: Arc<dyn SpeechPlayer>,
        frames: Arc<dyn FrameSource>,
    ) -> (Self, CoordinatorHandle) {
        let machine = SessionMachine::new(SessionState::new(config.welcome_message.clone()));
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(machine.state().clone());
        let (channel_tx, channel_rx) = watch::channel(machine.channel_status());
        let (recorder, recording_tx) = RecordingWorker::new(recorder);

        let handle = CoordinatorHandle {
            events: events_tx.clone(),
            control: control_tx,
            state: state_rx,
            channel: channel_rx,
        };
        let coordinator = Self {
            config,
            machine,
            backend,
            recorder: Some(recorder),
            recording_tx,
            player,
            frames,
            capture: FrameCapture::new(),
            channel: None,
            events_tx,
            events_rx,
            control_rx,
            state_tx,
            channel_tx,
        };
        (coordinator, handle)
    }

    /// Open the channel and process events until shutdown, or until every
    /// handle is dropped. Returns the final session state.
    pub async fn run(mut self) -> ClientResult<SessionState> {
        info!("🚀 Elysia session starting");
        let recording_task = self
            .recorder
            .take()
            .map(|worker| worker.spawn(self.events_tx.clone()));
        self.open_channel();

        loop {
            tokio::select! {
                biased;
                control = self.control_rx.recv() => match control {
                    Some(Control::Reconnect) => self.reconnect().await,
                    Some(Control::Shutdown) | None => break,
                },
                Some(event) = self.events_rx.recv() => self.dispatch(event),
            }
        }

        self.teardown().await;
        let Self {
            machine,
            recording_tx,
            ..
        } = self;
        // Let the worker finish the queued cancel before returning.
        drop(recording_tx);
        if let Some(task) = recording_task {
            let _ = task.await;
        }
        info!("👋 Elysia session ended");
        Ok(machine.into_state())
    }

    fn dispatch(&mut self, event: SessionEvent) {
        let effects = self.machine.handle(event);
        for effect in effects {
            self.execute(effect);
        }
        self.state_tx.send_replace(self.machine.state().clone());
        let status = self.machine.channel_status();
        self.channel_tx.send_if_modified(|current| {
            let changed = *current != status;
            *current = status;
            changed
        });
    }

    fn post(&self, event: SessionEvent) {
        let _ = self.events_tx.send(event);
    }

    fn execute(&mut self, effect: Effect) {
        debug!(?effect, "Running effect");
        match effect {
            Effect::SendChat { text } => {
                let sent = match &self.channel {
                    Some(channel) => channel.send(OutboundEvent::chat(text)),
                    None => Err(ClientError::ChannelClosed),
                };
                if let Err(e) = sent {
                    self.post(SessionEvent::ChatSendFailed(e.to_string()));
                }
            }
            Effect::VisionChat { text, frame } => {
                let backend = self.backend.clone();
                let events = self.events_tx.clone();
                tokio::spawn(async move {
                    let event = match backend.vision_chat(&text, &frame).await {
                        Ok(reply) => SessionEvent::VisionChatReplied(reply),
                        Err(e) => SessionEvent::VisionChatFailed {
                            text,
                            reason: e.to_string(),
                        },
                    };
                    let _ = events.send(event);
                });
            }
            Effect::Transcribe(clip) => {
                let backend = self.backend.clone();
                let events = self.events_tx.clone();
                tokio::spawn(async move {
                    let event = match backend.voice_chat(&clip).await {
                        Ok(reply) => SessionEvent::VoiceReplied(reply),
                        Err(e) => SessionEvent::VoiceFailed(e.to_string()),
                    };
                    let _ = events.send(event);
                });
            }
            Effect::AnalyzeFrame(frame) => {
                let backend = self.backend.clone();
                let events = self.events_tx.clone();
                tokio::spawn(async move {
                    let event = match backend.analyze_frame(&frame).await {
                        Ok(analysis) => SessionEvent::VisionAnalyzed(analysis),
                        Err(e) => SessionEvent::VisionAnalysisFailed(e.to_string()),
                    };
                    let _ = events.send(event);
                });
            }
            Effect::Speak { text } => self.speak(text),
            Effect::StartRecording => self.record(RecordingCommand::Start),
            Effect::StopRecording => self.record(RecordingCommand::Stop),
            Effect::CancelRecording => self.record(RecordingCommand::Cancel),
            Effect::StartCapture => {
                info!("📷 Camera on");
                self.capture.start(
                    self.frames.clone(),
                    self.config.frame_interval(),
                    self.events_tx.clone(),
                );
            }
            Effect::StopCapture => {
                info!("📷 Camera off");
                self.capture.stop();
            }
        }
    }

    fn record(&self, command: RecordingCommand) {
        if self.recording_tx.send(command).is_err() {
            self.post(SessionEvent::RecordingFailed("recorder unavailable".to_string()));
        }
    }

    fn speak(&self, text: String) {
        let backend = self.backend.clone();
        let player = self.player.clone();
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let audio = match backend.synthesize(&text).await {
                Ok(audio) => audio,
                Err(e) => {
                    let _ = events.send(SessionEvent::SpeechFailed(e.to_string()));
                    return;
                }
            };
            if audio.is_empty() {
                debug!("TTS returned no audio");
                return;
            }
            let _ = events.send(SessionEvent::SpeechStarted);
            let played = tokio::task::spawn_blocking(move || player.play(&audio)).await;
            match played {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    let _ = events.send(SessionEvent::SpeechFailed(e.to_string()));
                }
                Err(e) => {
                    let _ = events.send(SessionEvent::SpeechFailed(e.to_string()));
                }
            }
            let _ = events.send(SessionEvent::SpeechEnded);
        });
    }

    fn open_channel(&mut self) {
        self.dispatch(SessionEvent::ChannelConnecting);
        self.channel = Some(ChannelHandle::open(
            self.config.channel_url(),
            self.events_tx.clone(),
            self.config.heartbeat(),
        ));
    }

    async fn reconnect(&mut self) {
        info!("🔄 Reconnecting realtime channel");
        if let Some(channel) = self.channel.take() {
            channel.close().await;
        }
        // Apply the old channel's close before the new channel can open.
        while let Ok(event) = self.events_rx.try_recv() {
            self.dispatch(event);
        }
        self.open_channel();
    }

    async fn teardown(&mut self) {
        self.capture.stop();
        let _ = self.recording_tx.send(RecordingCommand::Cancel);
        if let Some(channel) = self.channel.take() {
            channel.close().await;
        }
        while let Ok(event) = self.events_rx.try_recv() {
            if matches!(event, SessionEvent::ChannelClosed | SessionEvent::ChatSendFailed(_)) {
                self.dispatch(event);
            }
        }
    }
}

impl CoordinatorHandle {
    fn post(&self, event: SessionEvent) -> ClientResult<()> {
        self.events
            .send(event)
            .map_err(|_| ClientError::CoordinatorGone)
    }

    fn control(&self, control: Control) -> ClientResult<()> {
        self.control
            .send(control)
            .map_err(|_| ClientError::CoordinatorGone)
    }

    /// Submit a chat turn. Blank text is ignored by the session.
    pub fn send_text(&self, text: impl Into<String>) -> ClientResult<()> {
        self.post(SessionEvent::TextSubmitted(text.into()))
    }

    pub fn toggle_listening(&self) -> ClientResult<()> {
        self.post(SessionEvent::ListeningToggled)
    }

    pub fn toggle_camera(&self) -> ClientResult<()> {
        self.post(SessionEvent::CameraToggled)
    }

    /// Hand over a frame captured outside the periodic task.
    pub fn push_frame(&self, frame: Frame) -> ClientResult<()> {
        self.post(SessionEvent::FrameCaptured(frame))
    }

    /// Submit a finished recording as a voice turn.
    pub fn voice_input(&self, clip: AudioClip) -> ClientResult<()> {
        self.post(SessionEvent::VoiceCaptured(clip))
    }

    pub fn speak(&self, text: impl Into<String>) -> ClientResult<()> {
        self.post(SessionEvent::SpeakRequested(text.into()))
    }

    pub fn reconnect(&self) -> ClientResult<()> {
        self.control(Control::Reconnect)
    }

    pub fn shutdown(&self) -> ClientResult<()> {
        self.control(Control::Shutdown)
    }

    /// Receiver that sees every published state.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receiver for realtime channel status changes.
    pub fn channel_status(&self) -> watch::Receiver<ChannelStatus> {
        self.channel.clone()
    }
}
