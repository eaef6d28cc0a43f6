//! Client configuration.

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Who drives the Black side.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GameMode {
    /// Red is the human; Black replies via the rules server's automated move.
    HumanVsAuto,
    /// Both sides are driven by cell activations; the scheduler never fires.
    HumanVsHuman,
}

/// Configuration for a game session.
#[derive(Debug, Clone, Getters, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Rules server base URL (scheme + host + port).
    #[serde(default = "default_base_url")]
    base_url: String,

    /// Delay before the automated reply, in milliseconds.
    ///
    /// Purely cosmetic: it gives the human move a chance to render before the
    /// reply lands. It carries no ordering guarantee.
    #[serde(default = "default_reply_delay_ms")]
    reply_delay_ms: u64,

    /// Game mode.
    #[serde(default = "default_mode")]
    mode: GameMode,
}

fn default_base_url() -> String {
    "http://localhost:5001".to_string()
}

fn default_reply_delay_ms() -> u64 {
    1000
}

fn default_mode() -> GameMode {
    GameMode::HumanVsAuto
}

impl ClientConfig {
    /// Creates a configuration with the given base URL and defaults elsewhere.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            reply_delay_ms: default_reply_delay_ms(),
            mode: default_mode(),
        }
    }

    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        info!(base_url = %config.base_url, mode = %config.mode, "Config loaded");
        Ok(config)
    }

    /// Builds configuration from the environment, loading `.env` first.
    ///
    /// Recognizes `XIANGQI_ORACLE_URL`, `XIANGQI_REPLY_DELAY_MS`, and
    /// `XIANGQI_GAME_MODE`; unset variables fall back to defaults.
    #[instrument]
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let base_url =
            std::env::var("XIANGQI_ORACLE_URL").unwrap_or_else(|_| default_base_url());

        let reply_delay_ms = match std::env::var("XIANGQI_REPLY_DELAY_MS") {
            Ok(raw) => raw.parse().map_err(|_| {
                ConfigError::new(format!("XIANGQI_REPLY_DELAY_MS is not a number: {}", raw))
            })?,
            Err(_) => default_reply_delay_ms(),
        };

        let mode = match std::env::var("XIANGQI_GAME_MODE") {
            Ok(raw) => raw.parse().map_err(|_| {
                ConfigError::new(format!("XIANGQI_GAME_MODE is not a valid mode: {}", raw))
            })?,
            Err(_) => default_mode(),
        };

        info!(base_url = %base_url, mode = %mode, "Config built from environment");
        Ok(Self {
            base_url,
            reply_delay_ms,
            mode,
        })
    }

    /// Returns the reply delay as a [`Duration`].
    pub fn reply_delay(&self) -> Duration {
        Duration::from_millis(self.reply_delay_ms)
    }

    /// Sets the reply delay in milliseconds.
    pub fn with_reply_delay_ms(mut self, reply_delay_ms: u64) -> Self {
        self.reply_delay_ms = reply_delay_ms;
        self
    }

    /// Sets the game mode.
    pub fn with_mode(mut self, mode: GameMode) -> Self {
        self.mode = mode;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            reply_delay_ms: default_reply_delay_ms(),
            mode: default_mode(),
        }
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where the error occurred.
    pub line: u32,
    /// Source file where the error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error with caller location tracking.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}
