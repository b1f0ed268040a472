//! **Recording sessions**: one start/stop cycle, one audio artifact.
//!
//! A [`Recorder`] is the microphone collaborator. [`RecordingSession`] wraps it
//! with the `Idle → Capturing → Flushing → Idle` lifecycle so a stop without a
//! start (or a double start) is reported instead of reaching the device.

use crate::error::{VoiceError, VoiceResult};
use crate::wav::clip_from_pcm;
use elysia_core::AudioClip;
use tracing::{debug, info, warn};

/// Microphone collaborator: produces exactly one clip per start/stop cycle.
pub trait Recorder: Send {
    /// Open the device and begin buffering audio.
    fn start(&mut self) -> VoiceResult<()>;

    /// Stop capturing and return everything buffered since `start`.
    fn stop(&mut self) -> VoiceResult<AudioClip>;
}

impl<R: Recorder + ?Sized> Recorder for Box<R> {
    fn start(&mut self) -> VoiceResult<()> {
        (**self).start()
    }

    fn stop(&mut self) -> VoiceResult<AudioClip> {
        (**self).stop()
    }
}

/// Where a recording session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingPhase {
    Idle,
    Capturing,
    /// Device stopped, artifact being assembled.
    Flushing,
}

/// Drives a [`Recorder`] through one capture at a time.
pub struct RecordingSession<R> {
    recorder: R,
    phase: RecordingPhase,
    captures: u64,
}

impl<R: Recorder> RecordingSession<R> {
    pub fn new(recorder: R) -> Self {
        Self {
            recorder,
            phase: RecordingPhase::Idle,
            captures: 0,
        }
    }

    pub fn phase(&self) -> RecordingPhase {
        self.phase
    }

    /// Completed captures so far.
    pub fn captures(&self) -> u64 {
        self.captures
    }

    /// Start capturing. A device failure leaves the session idle.
    pub fn begin(&mut self) -> VoiceResult<()> {
        if self.phase != RecordingPhase::Idle {
            return Err(VoiceError::InvalidState(format!(
                "cannot start while {:?}",
                self.phase
            )));
        }
        self.recorder.start()?;
        self.phase = RecordingPhase::Capturing;
        info!("🎙️ Recording started");
        Ok(())
    }

    /// Stop capturing and return the artifact. The session is idle afterwards,
    /// whether or not the flush succeeded.
    pub fn finish(&mut self) -> VoiceResult<AudioClip> {
        if self.phase != RecordingPhase::Capturing {
            return Err(VoiceError::InvalidState(format!(
                "cannot stop while {:?}",
                self.phase
            )));
        }
        self.phase = RecordingPhase::Flushing;
        let result = self.recorder.stop();
        self.phase = RecordingPhase::Idle;
        match &result {
            Ok(clip) => {
                self.captures += 1;
                info!(bytes = clip.len(), "⏹️ Recording flushed");
            }
            Err(e) => warn!(error = %e, "Recording flush failed"),
        }
        result
    }

    /// Stop an in-flight capture and throw the artifact away.
    pub fn cancel(&mut self) {
        if self.phase == RecordingPhase::Capturing {
            debug!("Discarding in-flight recording");
            let _ = self.finish();
        }
    }
}

/// Placeholder recorder: returns a canned clip. Use for headless runs and tests.
#[derive(Debug, Clone)]
pub struct PlaceholderRecorder {
    clip: AudioClip,
    fail_with: Option<String>,
    recording: bool,
}

impl PlaceholderRecorder {
    /// 100 ms of silence at 16 kHz.
    pub fn new() -> Self {
        Self::with_clip(clip_from_pcm(&[0.0; 1600], 16000))
    }

    pub fn with_clip(clip: AudioClip) -> Self {
        Self {
            clip,
            fail_with: None,
            recording: false,
        }
    }

    /// A recorder whose device is never available (e.g. permission denied).
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            fail_with: Some(reason.into()),
            ..Self::new()
        }
    }
}

impl Default for PlaceholderRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl Recorder for PlaceholderRecorder {
    fn start(&mut self) -> VoiceResult<()> {
        if let Some(reason) = &self.fail_with {
            return Err(VoiceError::Device(reason.clone()));
        }
        self.recording = true;
        Ok(())
    }

    fn stop(&mut self) -> VoiceResult<AudioClip> {
        if !std::mem::replace(&mut self.recording, false) {
            return Err(VoiceError::InvalidState("placeholder was not recording".to_string()));
        }
        Ok(self.clip.clone())
    }
}
