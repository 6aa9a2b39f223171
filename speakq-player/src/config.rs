//! Configuration for speakq-player
//!
//! Bootstrap configuration loaded from TOML. Every field has a built-in
//! default, so an absent file or an empty table yields a working setup.
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments (--config, --no-pause-support, --log-level)
//! 2. Environment variables (SPEAKQ_CONFIG, RUST_LOG)
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Top-level configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerConfig {
    /// Broadcast channel capacity for status/voice events
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    /// Controller timing constants
    #[serde(default)]
    pub timing: TimingConfig,

    /// Simulated engine behaviour (binary only)
    #[serde(default)]
    pub engine: EngineConfig,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Controller timing constants, all in milliseconds
#[derive(Debug, Clone, Deserialize)]
pub struct TimingConfig {
    /// Quiet period before a coalesced status notification is emitted
    #[serde(default = "default_status_quiet_period_ms")]
    pub status_quiet_period_ms: u64,

    /// How long to wait for the engine's pause callback before treating
    /// the engine as unable to pause
    #[serde(default = "default_pause_probe_timeout_ms")]
    pub pause_probe_timeout_ms: u64,

    /// Gap inserted between consecutive items
    #[serde(default = "default_natural_pause_ms")]
    pub natural_pause_ms: u64,
}

/// Simulated engine configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Whether the simulated engine honours pause requests
    #[serde(default = "default_supports_pause")]
    pub supports_pause: bool,

    /// Speaking speed at rate 1.0
    #[serde(default = "default_words_per_minute")]
    pub words_per_minute: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_event_capacity() -> usize {
    100
}

fn default_status_quiet_period_ms() -> u64 {
    8
}

fn default_pause_probe_timeout_ms() -> u64 {
    33
}

fn default_natural_pause_ms() -> u64 {
    500
}

fn default_supports_pause() -> bool {
    true
}

fn default_words_per_minute() -> u32 {
    180
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            event_capacity: default_event_capacity(),
            timing: TimingConfig::default(),
            engine: EngineConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            status_quiet_period_ms: default_status_quiet_period_ms(),
            pause_probe_timeout_ms: default_pause_probe_timeout_ms(),
            natural_pause_ms: default_natural_pause_ms(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            supports_pause: default_supports_pause(),
            words_per_minute: default_words_per_minute(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl TimingConfig {
    pub fn status_quiet_period(&self) -> Duration {
        Duration::from_millis(self.status_quiet_period_ms)
    }

    pub fn pause_probe_timeout(&self) -> Duration {
        Duration::from_millis(self.pause_probe_timeout_ms)
    }

    pub fn natural_pause(&self) -> Duration {
        Duration::from_millis(self.natural_pause_ms)
    }
}

impl PlayerConfig {
    /// Load configuration following the settings priority order
    ///
    /// `cli_path` comes from `--config`; otherwise `SPEAKQ_CONFIG` and the
    /// platform config directory are consulted before falling back to defaults.
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let config: Self = speakq_common::config::load_or_default(
            cli_path,
            speakq_common::config::CONFIG_ENV_VAR,
        )?;
        if config.event_capacity == 0 {
            return Err(Error::Config(
                "event_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(config)
    }
}
