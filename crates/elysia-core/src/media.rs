//! Camera frames and recorded audio handed to the backend.

use crate::error::{CoreError, CoreResult};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

/// One still image from the camera collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub bytes: Vec<u8>,
    pub mime: String,
}

impl Frame {
    pub fn jpeg(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            mime: "image/jpeg".to_string(),
        }
    }

    /// Decode a `data:<mime>;base64,<payload>` screenshot URL.
    pub fn from_data_url(url: &str) -> CoreResult<Self> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| CoreError::InvalidMedia("missing data: scheme".to_string()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| CoreError::InvalidMedia("missing payload separator".to_string()))?;
        let mime = header
            .strip_suffix(";base64")
            .ok_or_else(|| CoreError::InvalidMedia("only base64 data URLs are supported".to_string()))?;
        let bytes = BASE64
            .decode(payload.trim())
            .map_err(|e| CoreError::InvalidMedia(e.to_string()))?;
        if bytes.is_empty() {
            return Err(CoreError::InvalidMedia("empty image".to_string()));
        }
        let mime = if mime.is_empty() { "image/jpeg" } else { mime };
        Ok(Self {
            bytes,
            mime: mime.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// The single audio artifact produced by one recording session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub bytes: Vec<u8>,
    pub mime: String,
}

impl AudioClip {
    pub fn wav(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            mime: "audio/wav".to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
