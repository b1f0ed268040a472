//! # Elysia Core - session state and turn transitions
//!
//! Everything the companion client knows about a conversation lives here, with
//! no I/O: the append-only message log, the avatar-facing flags, the wire codec
//! for the realtime channel and REST replies, and the [`SessionMachine`] that
//! turns every input into a list of [`Effect`]s for the coordinator to run.
//!
//! ## Turn flow
//!
//! ```text
//!  SessionEvent ──► SessionMachine::handle ──► Vec<Effect>
//!       ▲                 │                         │
//!       │           SessionState              (network / device)
//!       └──────────── completion events ◄───────────┘
//! ```

pub mod config;
pub mod emotion;
pub mod error;
pub mod media;
pub mod message;
pub mod state;
pub mod transition;
pub mod wire;

pub use config::ClientConfig;
pub use emotion::{AvatarStyle, Emotion};
pub use error::{CoreError, CoreResult};
pub use media::{AudioClip, Frame};
pub use message::{Message, Role};
pub use state::{AvatarView, SessionState, DEFAULT_WELCOME};
pub use transition::{ChannelStatus, Effect, SessionEvent, SessionMachine};
pub use wire::{FrameAnalysis, InboundEvent, OutboundEvent, VisionChatReply, VoiceReply};
