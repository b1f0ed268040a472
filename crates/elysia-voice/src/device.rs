//! Microphone capture (CPAL) and speaker playback (Rodio).
//!
//! CPAL streams are not `Send`, so each capture owns a dedicated thread that
//! builds the stream, buffers samples, and hands them back when told to stop.

use crate::error::{VoiceError, VoiceResult};
use crate::playback::SpeechPlayer;
use crate::recorder::Recorder;
use crate::wav::clip_from_pcm;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use elysia_core::AudioClip;
use rodio::{Decoder, OutputStream, Sink, Source};
use std::io::Cursor;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use tracing::{info, warn};

struct ActiveCapture {
    stop_tx: mpsc::Sender<()>,
    thread: thread::JoinHandle<Vec<f32>>,
    sample_rate: u32,
}

/// Default input device recorder. Multi-channel input is downmixed to mono.
#[derive(Default)]
pub struct CpalRecorder {
    active: Option<ActiveCapture>,
}

impl CpalRecorder {
    pub fn new() -> Self {
        Self::default()
    }
}

fn open_stream(buffer: Arc<Mutex<Vec<f32>>>) -> VoiceResult<(cpal::Stream, u32)> {
    let device = cpal::default_host()
        .default_input_device()
        .ok_or_else(|| VoiceError::Device("No input device available".to_string()))?;
    info!(
        "📱 Using input device: {}",
        device.name().unwrap_or_else(|_| "Unknown".to_string())
    );
    let supported = device.default_input_config()?;
    let config: cpal::StreamConfig = supported.config();
    let channels = config.channels.max(1) as usize;
    let sample_rate = config.sample_rate.0;

    let stream = device.build_input_stream(
        &config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            if let Ok(mut buf) = buffer.lock() {
                for frame in data.chunks(channels) {
                    buf.push(frame.iter().sum::<f32>() / frame.len() as f32);
                }
            }
        },
        move |err| {
            warn!("Audio stream error: {}", err);
        },
        None,
    )?;
    stream.play()?;
    Ok((stream, sample_rate))
}

impl Recorder for CpalRecorder {
    fn start(&mut self) -> VoiceResult<()> {
        if self.active.is_some() {
            return Err(VoiceError::InvalidState("capture already running".to_string()));
        }
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let (ready_tx, ready_rx) = mpsc::channel::<VoiceResult<u32>>();

        let thread = thread::spawn(move || {
            let buffer = Arc::new(Mutex::new(Vec::new()));
            let stream = match open_stream(Arc::clone(&buffer)) {
                Ok((stream, rate)) => {
                    let _ = ready_tx.send(Ok(rate));
                    stream
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return Vec::new();
                }
            };
            // Either an explicit stop or the recorder being dropped ends the capture.
            let _ = stop_rx.recv();
            drop(stream);
            match buffer.lock() {
                Ok(mut buf) => std::mem::take(&mut *buf),
                Err(_) => Vec::new(),
            }
        });

        let sample_rate = ready_rx
            .recv()
            .map_err(|_| VoiceError::Device("capture thread exited during setup".to_string()))??;
        info!(sample_rate, "✅ Audio capture started");
        self.active = Some(ActiveCapture {
            stop_tx,
            thread,
            sample_rate,
        });
        Ok(())
    }

    fn stop(&mut self) -> VoiceResult<AudioClip> {
        let active = self
            .active
            .take()
            .ok_or_else(|| VoiceError::InvalidState("capture not running".to_string()))?;
        let _ = active.stop_tx.send(());
        let samples = active
            .thread
            .join()
            .map_err(|_| VoiceError::Stream("capture thread panicked".to_string()))?;
        info!(samples = samples.len(), "⏹️ Audio capture stopped");
        Ok(clip_from_pcm(&samples, active.sample_rate))
    }
}

/// Default output device player. Each call opens its own sink, so overlapping
/// calls play concurrently.
#[derive(Debug, Default, Clone)]
pub struct RodioPlayer;

impl RodioPlayer {
    pub fn new() -> Self {
        Self
    }
}

impl SpeechPlayer for RodioPlayer {
    fn play(&self, audio: &[u8]) -> VoiceResult<()> {
        if audio.is_empty() {
            return Ok(());
        }
        let (_stream, handle) =
            OutputStream::try_default().map_err(|e| VoiceError::Playback(e.to_string()))?;
        let sink = Sink::try_new(&handle).map_err(|e| VoiceError::Playback(e.to_string()))?;
        let source = Decoder::new(Cursor::new(audio.to_vec()))
            .map_err(|e| VoiceError::Playback(format!("Decode failed: {}", e)))?;
        sink.append(source.convert_samples::<f32>());
        sink.sleep_until_end();
        Ok(())
    }
}
