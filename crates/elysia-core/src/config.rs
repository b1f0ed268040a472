//! Client configuration loaded from TOML and environment.
//!
//! | Key | Env | Default |
//! |-----|-----|---------|
//! | api_base | ELYSIA__API_BASE or ELYSIA_API_URL | http://localhost:8000 |
//! | ws_base | ELYSIA__WS_BASE or ELYSIA_WS_URL | ws://localhost:8000 |
//! | frame_interval_ms | ELYSIA__FRAME_INTERVAL_MS | 5000 |
//! | request_timeout_secs | ELYSIA__REQUEST_TIMEOUT_SECS | 30 |
//! | heartbeat_secs | ELYSIA__HEARTBEAT_SECS | 30 (0 disables) |
//! | welcome_message | ELYSIA__WELCOME_MESSAGE | see [`DEFAULT_WELCOME`] |

use crate::error::CoreResult;
use crate::state::DEFAULT_WELCOME;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Where the backend lives and how often the client talks to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// HTTP origin for the REST endpoints, without trailing slash.
    pub api_base: String,
    /// Origin for the realtime channel (`ws://` or `wss://`).
    pub ws_base: String,
    /// Camera snapshot period while the camera is active.
    pub frame_interval_ms: u64,
    pub request_timeout_secs: u64,
    /// Channel heartbeat period; 0 turns the heartbeat off.
    pub heartbeat_secs: u64,
    pub welcome_message: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:8000".to_string(),
            ws_base: "ws://localhost:8000".to_string(),
            frame_interval_ms: 5000,
            request_timeout_secs: 30,
            heartbeat_secs: 30,
            welcome_message: DEFAULT_WELCOME.to_string(),
        }
    }
}

impl ClientConfig {
    /// Load config from file and environment. Precedence: env > `ELYSIA_CONFIG` path
    /// (default `config/client`, any supported extension) > defaults.
    pub fn load() -> CoreResult<Self> {
        let config_path =
            std::env::var("ELYSIA_CONFIG").unwrap_or_else(|_| "config/client".to_string());
        Self::load_from(Path::new(&config_path))
    }

    /// Same as [`ClientConfig::load`] with an explicit file path. A missing file is not an error.
    pub fn load_from(path: &Path) -> CoreResult<Self> {
        let defaults = Self::default();
        let builder = config::Config::builder()
            .set_default("api_base", defaults.api_base)?
            .set_default("ws_base", defaults.ws_base)?
            .set_default("frame_interval_ms", defaults.frame_interval_ms)?
            .set_default("request_timeout_secs", defaults.request_timeout_secs)?
            .set_default("heartbeat_secs", defaults.heartbeat_secs)?
            .set_default("welcome_message", defaults.welcome_message)?;

        let builder = match path.to_str() {
            Some(name) => builder.add_source(config::File::with_name(name).required(false)),
            None => builder,
        };

        let built = builder
            .add_source(config::Environment::with_prefix("ELYSIA").separator("__"))
            .set_override_option("api_base", std::env::var("ELYSIA_API_URL").ok())?
            .set_override_option("ws_base", std::env::var("ELYSIA_WS_URL").ok())?
            .build()?;

        let mut loaded: Self = built.try_deserialize()?;
        loaded.api_base = loaded.api_base.trim_end_matches('/').to_string();
        loaded.ws_base = loaded.ws_base.trim_end_matches('/').to_string();
        Ok(loaded)
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    /// Realtime chat channel URL.
    pub fn channel_url(&self) -> String {
        format!("{}/ws/chat", self.ws_base)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn heartbeat(&self) -> Option<Duration> {
        (self.heartbeat_secs > 0).then(|| Duration::from_secs(self.heartbeat_secs))
    }
}
