//! Configuration loading and typed config structures for the Relic Race.
//!
//! The canonical configuration lives in `relic-config.yaml` at the project
//! root. Every field has a default matching the standard race (100 days of
//! 24000 ticks, polling every 20 ticks), so an empty file is a valid
//! configuration.

use std::path::Path;

use serde::Deserialize;

/// Environment variable overriding `server.tick_interval_ms`.
pub const TICK_INTERVAL_ENV: &str = "RELIC_TICK_INTERVAL_MS";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but describes an impossible race.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level race configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GameConfig {
    /// Countdown and milestone settings.
    #[serde(default)]
    pub session: SessionConfig,

    /// Possession tracker settings.
    #[serde(default)]
    pub tracker: TrackerConfig,

    /// Day/night and holding-area settings of the world.
    #[serde(default)]
    pub world: WorldConfig,

    /// Server loop settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GameConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `RELIC_TICK_INTERVAL_MS` overrides `server.tick_interval_ms`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// Unparseable values are ignored with a warning.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(raw) = lookup(TICK_INTERVAL_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => self.server.tick_interval_ms = ms,
                Err(err) => tracing::warn!(
                    variable = TICK_INTERVAL_ENV,
                    value = raw,
                    error = %err,
                    "Ignoring unparseable override"
                ),
            }
        }
    }

    /// Check that the configuration describes a playable race.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| {
            Err(ConfigError::Invalid {
                reason: reason.to_owned(),
            })
        };
        if self.session.total_days == 0 {
            return invalid("session.total_days must be at least 1");
        }
        if self.session.ticks_per_day == 0 {
            return invalid("session.ticks_per_day must be at least 1");
        }
        if self
            .session
            .total_days
            .checked_mul(self.session.ticks_per_day)
            .is_none()
        {
            return invalid("session.total_days * session.ticks_per_day overflows");
        }
        if self.tracker.poll_interval_ticks == 0 {
            return invalid("tracker.poll_interval_ticks must be at least 1");
        }
        if !(self.tracker.trail_spacing.is_finite() && self.tracker.trail_spacing > 0.0) {
            return invalid("tracker.trail_spacing must be a positive number");
        }
        if self.world.day_length_ticks == 0 {
            return invalid("world.day_length_ticks must be at least 1");
        }
        Ok(())
    }
}

/// Countdown and milestone configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionConfig {
    /// Length of the race in in-game days.
    #[serde(default = "default_total_days")]
    pub total_days: u64,

    /// Session ticks per in-game day.
    #[serde(default = "default_ticks_per_day")]
    pub ticks_per_day: u64,

    /// Milestones at or below this many days left add a warning.
    #[serde(default = "default_warning_days")]
    pub warning_days: u64,

    /// Milestone at exactly this many days left adds the final warning.
    #[serde(default = "default_final_warning_days")]
    pub final_warning_days: u64,

    /// Delay in ticks between the victory banner and the reward effect.
    #[serde(default = "default_reward_delay_ticks")]
    pub reward_delay_ticks: u64,
}

impl SessionConfig {
    /// Total countdown length in ticks (saturating).
    pub const fn total_ticks(&self) -> u64 {
        self.total_days.saturating_mul(self.ticks_per_day)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            total_days: default_total_days(),
            ticks_per_day: default_ticks_per_day(),
            warning_days: default_warning_days(),
            final_warning_days: default_final_warning_days(),
            reward_delay_ticks: default_reward_delay_ticks(),
        }
    }
}

/// Possession tracker configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrackerConfig {
    /// Ticks between two polls of the world.
    #[serde(default = "default_poll_interval_ticks")]
    pub poll_interval_ticks: u64,

    /// Ticks a trail marker lives before its decay timer removes it.
    #[serde(default = "default_marker_decay_ticks")]
    pub marker_decay_ticks: u64,

    /// Minimum distance between consecutive trail markers of one holder.
    #[serde(default = "default_trail_spacing")]
    pub trail_spacing: f64,

    /// Squared speed below which the look direction is used as facing.
    #[serde(default = "default_still_threshold")]
    pub still_threshold_sq: f64,

    /// Height above the holder's feet at which markers are placed.
    #[serde(default = "default_marker_lift")]
    pub marker_lift: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ticks: default_poll_interval_ticks(),
            marker_decay_ticks: default_marker_decay_ticks(),
            trail_spacing: default_trail_spacing(),
            still_threshold_sq: default_still_threshold(),
            marker_lift: default_marker_lift(),
        }
    }
}

/// World configuration used when building the simulated world.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Length of one world day in ticks.
    #[serde(default = "default_ticks_per_day")]
    pub day_length_ticks: u64,

    /// First tick of the night window.
    #[serde(default = "default_night_start")]
    pub night_start: u64,

    /// Last tick of the night window (inclusive).
    #[serde(default = "default_night_end")]
    pub night_end: u64,

    /// Slots in each participant's holding area.
    #[serde(default = "default_holding_capacity")]
    pub holding_capacity: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            day_length_ticks: default_ticks_per_day(),
            night_start: default_night_start(),
            night_end: default_night_end(),
            holding_capacity: default_holding_capacity(),
        }
    }
}

/// Server loop configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// Real-time milliseconds per server tick.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Start a session as soon as the server boots.
    #[serde(default = "default_true")]
    pub auto_start: bool,

    /// Capacity of the gateway request channel.
    #[serde(default = "default_command_buffer")]
    pub command_buffer: usize,

    /// Stop the server loop after this many ticks (0 = unlimited).
    #[serde(default)]
    pub max_server_ticks: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            auto_start: true,
            command_buffer: default_command_buffer(),
            max_server_ticks: 0,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level used when `RUST_LOG` is unset (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

const fn default_total_days() -> u64 {
    100
}

const fn default_ticks_per_day() -> u64 {
    24_000
}

const fn default_warning_days() -> u64 {
    10
}

const fn default_final_warning_days() -> u64 {
    1
}

const fn default_reward_delay_ticks() -> u64 {
    20
}

const fn default_poll_interval_ticks() -> u64 {
    20
}

const fn default_marker_decay_ticks() -> u64 {
    120_000
}

const fn default_trail_spacing() -> f64 {
    5.0
}

const fn default_still_threshold() -> f64 {
    0.01
}

const fn default_marker_lift() -> f64 {
    0.1
}

const fn default_night_start() -> u64 {
    13_000
}

const fn default_night_end() -> u64 {
    23_000
}

const fn default_holding_capacity() -> usize {
    36
}

const fn default_tick_interval_ms() -> u64 {
    50
}

const fn default_command_buffer() -> usize {
    32
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_true() -> bool {
    true
}
