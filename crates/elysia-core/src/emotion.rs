//! **Emotion labels** and the avatar style each one maps to.
//!
//! The backend's emotion engine emits free-form labels. The known set maps to a
//! fixed avatar palette; anything else is kept verbatim as [`Emotion::Other`] and
//! renders with the neutral style.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Emotion reported by the backend for the latest agent reply.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Emotion {
    Happy,
    Sad,
    Angry,
    #[default]
    Neutral,
    Loving,
    Curious,
    /// Label outside the known set (trimmed, lower-cased).
    Other(String),
}

impl Emotion {
    /// Parse a backend label. Case and surrounding whitespace are ignored;
    /// an empty label is treated as neutral.
    pub fn parse(label: &str) -> Self {
        let label = label.trim().to_ascii_lowercase();
        match label.as_str() {
            "happy" => Emotion::Happy,
            "sad" => Emotion::Sad,
            "angry" => Emotion::Angry,
            "neutral" | "" => Emotion::Neutral,
            "loving" => Emotion::Loving,
            "curious" => Emotion::Curious,
            _ => Emotion::Other(label),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Angry => "angry",
            Emotion::Neutral => "neutral",
            Emotion::Loving => "loving",
            Emotion::Curious => "curious",
            Emotion::Other(label) => label,
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Emotion {
    fn from(label: String) -> Self {
        Emotion::parse(&label)
    }
}

impl From<&str> for Emotion {
    fn from(label: &str) -> Self {
        Emotion::parse(label)
    }
}

impl From<Emotion> for String {
    fn from(emotion: Emotion) -> Self {
        emotion.as_str().to_string()
    }
}

/// Render parameters for the avatar core and its particle field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AvatarStyle {
    /// Fill colour of the core shape.
    pub color: &'static str,
    /// Drop-shadow glow.
    pub glow: &'static str,
    /// Resting scale factor.
    pub scale: f32,
    /// Animation speed multiplier.
    pub speed: f32,
    pub particle_count: u32,
}

const NEUTRAL_STYLE: AvatarStyle = AvatarStyle {
    color: "#E6E6FA",
    glow: "rgba(230, 230, 250, 0.5)",
    scale: 1.0,
    speed: 1.0,
    particle_count: 10,
};

impl AvatarStyle {
    pub fn for_emotion(emotion: &Emotion) -> Self {
        match emotion {
            Emotion::Happy => AvatarStyle {
                color: "#FFD700",
                glow: "rgba(255, 215, 0, 0.5)",
                scale: 1.1,
                speed: 1.5,
                particle_count: 20,
            },
            Emotion::Sad => AvatarStyle {
                color: "#4682B4",
                glow: "rgba(70, 130, 180, 0.5)",
                scale: 0.9,
                speed: 0.5,
                particle_count: 5,
            },
            Emotion::Angry => AvatarStyle {
                color: "#FF4500",
                glow: "rgba(255, 69, 0, 0.5)",
                scale: 1.2,
                speed: 2.0,
                particle_count: 30,
            },
            Emotion::Loving => AvatarStyle {
                color: "#FF69B4",
                glow: "rgba(255, 105, 180, 0.5)",
                scale: 1.05,
                speed: 1.2,
                particle_count: 25,
            },
            Emotion::Curious => AvatarStyle {
                color: "#98FB98",
                glow: "rgba(152, 251, 152, 0.5)",
                scale: 1.0,
                speed: 1.3,
                particle_count: 15,
            },
            Emotion::Neutral | Emotion::Other(_) => NEUTRAL_STYLE,
        }
    }
}
