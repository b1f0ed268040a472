//! # Elysia Voice - recording sessions and speech playback
//!
//! The coordinator never talks to audio hardware directly. It drives a
//! [`RecordingSession`] around any [`Recorder`] and hands synthesized speech to
//! a [`SpeechPlayer`].
//!
//! ```text
//!  toggle on ──► Idle ──begin()──► Capturing ──finish()──► Flushing ──► Idle
//!                                                              │
//!                                                        one AudioClip
//! ```
//!
//! Placeholder implementations run anywhere; the `device` feature adds
//! microphone capture through `cpal` and playback through `rodio`.

#[cfg(feature = "device")]
pub mod device;
pub mod error;
pub mod playback;
pub mod recorder;
pub mod wav;

#[cfg(feature = "device")]
pub use device::{CpalRecorder, RodioPlayer};
pub use error::{VoiceError, VoiceResult};
pub use playback::{SilentPlayer, SpeechPlayer};
pub use recorder::{PlaceholderRecorder, Recorder, RecordingPhase, RecordingSession};
pub use wav::{clip_from_pcm, pcm_f32_to_wav};
