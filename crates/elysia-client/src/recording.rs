//! Recorder calls off the event loop.
//!
//! Device recorders block on start (stream handshake) and stop (thread join),
//! so every command runs on the blocking pool. Commands are applied strictly in
//! the order they were queued.

use elysia_core::SessionEvent;
use elysia_voice::{Recorder, RecordingSession};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingCommand {
    Start,
    Stop,
    /// Stop and throw the audio away.
    Cancel,
}

/// Owns the [`RecordingSession`] and applies queued commands one at a time.
pub struct RecordingWorker {
    session: RecordingSession<Box<dyn Recorder>>,
    commands: mpsc::UnboundedReceiver<RecordingCommand>,
}

impl RecordingWorker {
    pub fn new(recorder: Box<dyn Recorder>) -> (Self, mpsc::UnboundedSender<RecordingCommand>) {
        let (tx, commands) = mpsc::unbounded_channel();
        let worker = Self {
            session: RecordingSession::new(recorder),
            commands,
        };
        (worker, tx)
    }

    /// Run until every command sender is dropped. Outcomes land on `events`.
    pub fn spawn(self, events: mpsc::UnboundedSender<SessionEvent>) -> JoinHandle<()> {
        tokio::spawn(self.run(events))
    }

    async fn run(self, events: mpsc::UnboundedSender<SessionEvent>) {
        let Self {
            mut session,
            mut commands,
        } = self;
        while let Some(command) = commands.recv().await {
            let outcome = tokio::task::spawn_blocking(move || {
                let event = apply(&mut session, command);
                (session, event)
            })
            .await;
            match outcome {
                Ok((returned, event)) => {
                    session = returned;
                    if let Some(event) = event {
                        let _ = events.send(event);
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Recorder task died, recording disabled");
                    let _ = events.send(SessionEvent::RecordingFailed(e.to_string()));
                    return;
                }
            }
        }
        debug!("Recording worker stopped");
    }
}

fn apply(
    session: &mut RecordingSession<Box<dyn Recorder>>,
    command: RecordingCommand,
) -> Option<SessionEvent> {
    match command {
        RecordingCommand::Start => session
            .begin()
            .err()
            .map(|e| SessionEvent::RecordingFailed(e.to_string())),
        RecordingCommand::Stop => Some(match session.finish() {
            Ok(clip) => SessionEvent::VoiceCaptured(clip),
            Err(e) => SessionEvent::RecordingFailed(e.to_string()),
        }),
        RecordingCommand::Cancel => {
            session.cancel();
            None
        }
    }
}
