//! Configuration management for segue-player
//!
//! Two tiers:
//! 1. **Command line** (`--config`, `--playlist`, env fallbacks) parsed in main.rs
//! 2. **TOML file**: logging, engine tunables, stream preferences
//!
//! Every TOML key is optional. Missing keys fall back to built-in defaults
//! defined here, so an absent config file is not an error.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Configuration loaded from the TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub engine: EngineTuning,

    #[serde(default)]
    pub stream: StreamConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Engine tunables
///
/// The prestart lead and end epsilon trade CPU/bandwidth (earlier prestart)
/// against gap risk on slow networks (later prestart).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineTuning {
    /// Seconds before the end of the active track at which the pending
    /// session starts playing muted
    pub prestart_lead_secs: f64,

    /// Seconds before the end at which promotion happens without waiting
    /// for the finish signal
    pub end_epsilon_secs: f64,

    /// Seconds before the end at which the autoplay supplier is queried
    /// when nothing follows the current track
    pub autoplay_lead_secs: f64,

    /// Skip-previous inside this window restarts the current track
    pub restart_threshold_secs: f64,

    /// Maximum number of suggestions requested per autoplay fetch
    pub autoplay_limit: usize,

    pub autoplay_enabled: bool,

    /// Process volume at startup (0.0-1.0)
    pub initial_volume: f32,

    /// Position callback interval for backends that poll (simulated backend)
    pub position_interval_ms: u64,

    /// Capacity of the event broadcast channel
    pub event_capacity: usize,
}

impl Default for EngineTuning {
    fn default() -> Self {
        Self {
            prestart_lead_secs: 0.4,
            end_epsilon_secs: 0.02,
            autoplay_lead_secs: 10.0,
            restart_threshold_secs: 3.0,
            autoplay_limit: 20,
            autoplay_enabled: false,
            initial_volume: 0.75,
            position_interval_ms: 20,
            event_capacity: 256,
        }
    }
}

impl EngineTuning {
    /// Reject tunables the transition algorithm cannot work with
    pub fn validate(&self) -> Result<()> {
        let non_negative = [
            ("prestart_lead_secs", self.prestart_lead_secs),
            ("end_epsilon_secs", self.end_epsilon_secs),
            ("autoplay_lead_secs", self.autoplay_lead_secs),
            ("restart_threshold_secs", self.restart_threshold_secs),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::Config(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        if self.end_epsilon_secs >= self.prestart_lead_secs {
            return Err(Error::Config(format!(
                "end_epsilon_secs ({}) must be smaller than prestart_lead_secs ({})",
                self.end_epsilon_secs, self.prestart_lead_secs
            )));
        }

        if !(0.0..=1.0).contains(&self.initial_volume) {
            return Err(Error::Config(format!(
                "initial_volume must be within 0.0-1.0, got {}",
                self.initial_volume
            )));
        }

        if self.position_interval_ms == 0 {
            return Err(Error::Config("position_interval_ms must be > 0".to_string()));
        }

        if self.event_capacity == 0 {
            return Err(Error::Config("event_capacity must be > 0".to_string()));
        }

        Ok(())
    }

    pub fn position_interval(&self) -> Duration {
        Duration::from_millis(self.position_interval_ms)
    }
}

/// Stream format the resolver is asked for
///
/// Consumed, not decided, by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FormatPreference {
    /// Whatever the server stores
    #[default]
    Original,
    /// Server-side transcode
    Transcoded { codec: String, max_bitrate_kbps: u32 },
}

/// Stream resolution settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Base URL prepended to stream paths
    pub base_url: String,

    pub format: FormatPreference,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            base_url: "segue://local".to_string(),
            format: FormatPreference::Original,
        }
    }
}

impl TomlConfig {
    /// Load and validate configuration
    ///
    /// `path` is the already-resolved config path; `None` means built-in
    /// defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config: TomlConfig = segue_common::config::load_or_default(path)?;
        config.engine.validate()?;

        match path {
            Some(p) => info!("Loaded TOML configuration from {}", p.display()),
            None => info!("No configuration file, using built-in defaults"),
        }
        Ok(config)
    }
}
