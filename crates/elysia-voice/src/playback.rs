//! **Speech playback**: plays synthesized audio to completion.

use crate::error::VoiceResult;
use std::time::Duration;

/// Speaker collaborator. `play` blocks until the audio has finished, so callers
/// run it on a blocking thread and treat its return as the end of speech.
pub trait SpeechPlayer: Send + Sync {
    fn play(&self, audio: &[u8]) -> VoiceResult<()>;
}

/// Placeholder player: plays nothing, optionally holding for a fixed time so
/// the speaking flag stays visible.
#[derive(Debug, Clone, Default)]
pub struct SilentPlayer {
    hold: Duration,
}

impl SilentPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hold(hold: Duration) -> Self {
        Self { hold }
    }
}

impl SpeechPlayer for SilentPlayer {
    fn play(&self, audio: &[u8]) -> VoiceResult<()> {
        if audio.is_empty() || self.hold.is_zero() {
            return Ok(());
        }
        std::thread::sleep(self.hold);
        Ok(())
    }
}
