//! **Session state**: the single store the presentation layer renders from.
//!
//! Built explicitly by whoever owns the session (normally the coordinator) and
//! mutated only by [`crate::SessionMachine`]. Readers get clones or `&` access;
//! there is no public way to edit or remove a message.

use crate::emotion::{AvatarStyle, Emotion};
use crate::message::Message;
use serde::Serialize;

/// Greeting seeded into every new session.
pub const DEFAULT_WELCOME: &str = "Hello. I'm Elysia. It's nice to meet you.";

/// Conversation history plus the UI/session flags.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionState {
    messages: Vec<Message>,
    emotion: Emotion,
    is_speaking: bool,
    is_listening: bool,
    is_typing: bool,
    camera_active: bool,
    vision_analysis: Option<String>,
}

impl SessionState {
    /// New session seeded with one agent welcome message.
    pub fn new(welcome: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::agent(welcome).stamped()],
            emotion: Emotion::Neutral,
            is_speaking: false,
            is_listening: false,
            is_typing: false,
            camera_active: false,
            vision_analysis: None,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn emotion(&self) -> &Emotion {
        &self.emotion
    }

    pub fn is_speaking(&self) -> bool {
        self.is_speaking
    }

    pub fn is_listening(&self) -> bool {
        self.is_listening
    }

    pub fn is_typing(&self) -> bool {
        self.is_typing
    }

    pub fn camera_active(&self) -> bool {
        self.camera_active
    }

    pub fn vision_analysis(&self) -> Option<&str> {
        self.vision_analysis.as_deref()
    }

    /// What the avatar should look like for the current flags.
    pub fn avatar(&self) -> AvatarView {
        AvatarView {
            style: AvatarStyle::for_emotion(&self.emotion),
            mouth_open: self.is_speaking,
            attentive: self.is_listening || self.is_typing,
            eyes_narrowed: self.emotion == Emotion::Sad,
        }
    }

    pub(crate) fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub(crate) fn set_emotion(&mut self, emotion: Emotion) {
        self.emotion = emotion;
    }

    pub(crate) fn set_speaking(&mut self, value: bool) {
        self.is_speaking = value;
    }

    pub(crate) fn set_listening(&mut self, value: bool) {
        self.is_listening = value;
    }

    pub(crate) fn set_typing(&mut self, value: bool) {
        self.is_typing = value;
    }

    pub(crate) fn set_camera_active(&mut self, value: bool) {
        self.camera_active = value;
    }

    pub(crate) fn set_vision_analysis(&mut self, value: Option<String>) {
        self.vision_analysis = value;
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(DEFAULT_WELCOME)
    }
}

/// Avatar render inputs derived from [`SessionState`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AvatarView {
    pub style: AvatarStyle,
    /// Speech wave drawn while audio is playing.
    pub mouth_open: bool,
    /// Listening or waiting on a reply.
    pub attentive: bool,
    pub eyes_narrowed: bool,
}
