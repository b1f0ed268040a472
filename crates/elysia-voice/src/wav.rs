//! 16-bit PCM WAV encoding for upload to the transcription endpoint.

use elysia_core::AudioClip;

/// Encode mono f32 PCM to 16-bit WAV bytes. Samples are clamped to -1.0..=1.0.
pub fn pcm_f32_to_wav(samples: &[f32], sample_rate: u32) -> Vec<u8> {
    let data_len = (samples.len() * 2) as u32; // 16-bit = 2 bytes per sample
    let mut buf = Vec::with_capacity(44 + data_len as usize);
    // RIFF header
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&(36 + data_len).to_le_bytes());
    buf.extend_from_slice(b"WAVE");
    // fmt subchunk
    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes());
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
    buf.extend_from_slice(&1u16.to_le_bytes()); // mono
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&(sample_rate * 2).to_le_bytes()); // byte rate
    buf.extend_from_slice(&2u16.to_le_bytes()); // block align
    buf.extend_from_slice(&16u16.to_le_bytes()); // bits per sample
    // data subchunk
    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_len.to_le_bytes());
    for &s in samples {
        let i = (s.clamp(-1.0, 1.0) * 32767.0).round() as i16;
        buf.extend_from_slice(&i.to_le_bytes());
    }
    buf
}

/// Wrap captured PCM as the WAV clip the backend expects.
pub fn clip_from_pcm(samples: &[f32], sample_rate: u32) -> AudioClip {
    AudioClip::wav(pcm_f32_to_wav(samples, sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_describes_payload() {
        let wav = pcm_f32_to_wav(&[0.0, 1.0, -1.0, 2.0], 16000);
        assert_eq!(wav.len(), 44 + 8);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(u32::from_le_bytes(wav[4..8].try_into().unwrap()), 44);
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(u32::from_le_bytes(wav[24..28].try_into().unwrap()), 16000);
        assert_eq!(u32::from_le_bytes(wav[40..44].try_into().unwrap()), 8);
    }

    #[test]
    fn samples_are_clamped() {
        let wav = pcm_f32_to_wav(&[1.0, 2.0, -3.0], 8000);
        let s = |i: usize| i16::from_le_bytes([wav[44 + i * 2], wav[45 + i * 2]]);
        assert_eq!(s(0), 32767);
        assert_eq!(s(1), 32767);
        assert_eq!(s(2), -32767);
    }

    #[test]
    fn clip_is_tagged_as_wav() {
        let clip = clip_from_pcm(&[], 16000);
        assert_eq!(clip.mime, "audio/wav");
        assert_eq!(clip.len(), 44);
    }
}
