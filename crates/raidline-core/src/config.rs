//! Configuration loading and typed config structures for the Raidline engine.
//!
//! The canonical configuration lives in `raidline-config.yaml` in the
//! working directory. This module defines strongly-typed structs that
//! mirror the YAML structure, and provides a loader that reads and
//! validates the file. Every section is optional; missing values take the
//! regulation defaults below.

use std::path::Path;

use serde::Deserialize;

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

    /// A duration or limit that must be positive was zero.
    #[error("config value {field} must be positive")]
    NonPositive {
        /// Dotted path of the offending field.
        field: &'static str,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level engine configuration.
///
/// Mirrors the structure of `raidline-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    /// Clock durations and timeout allowance.
    #[serde(default)]
    pub timers: TimerConfig,

    /// Audio cue settings.
    #[serde(default)]
    pub audio: AudioConfig,

    /// Tie-breaker settings.
    #[serde(default)]
    pub tie_breaker: TieBreakerConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `RAIDLINE_AUDIO_MUTED` overrides `audio.muted` when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::NonPositive`] if a timer is zero.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::NonPositive`] if a timer is zero.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.audio.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Reject zero durations, a zero sync interval, and a zero timeout
    /// allowance.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NonPositive`] naming the first zero field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.timers;
        let checks: [(&'static str, u32); 6] = [
            ("timers.raid_duration", t.raid_duration),
            ("timers.half_duration", t.half_duration),
            ("timers.interval_duration", t.interval_duration),
            ("timers.timeout_duration", t.timeout_duration),
            ("timers.max_timeouts", u32::from(t.max_timeouts)),
            ("timers.sync_interval", t.sync_interval),
        ];
        match checks.into_iter().find(|&(_, value)| value == 0) {
            Some((field, _)) => Err(ConfigError::NonPositive { field }),
            None => Ok(()),
        }
    }
}

/// Clock durations, in seconds, and the timeout allowance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TimerConfig {
    /// Length of the per-raid countdown.
    #[serde(default = "default_raid_duration")]
    pub raid_duration: u32,

    /// Length of each half.
    #[serde(default = "default_half_duration")]
    pub half_duration: u32,

    /// Length of the half-time interval.
    #[serde(default = "default_interval_duration")]
    pub interval_duration: u32,

    /// Length of a timeout.
    #[serde(default = "default_timeout_duration")]
    pub timeout_duration: u32,

    /// Team timeouts allowed per match.
    #[serde(default = "default_max_timeouts")]
    pub max_timeouts: u8,

    /// Seconds between periodic clock syncs to persistence.
    #[serde(default = "default_sync_interval")]
    pub sync_interval: u32,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            raid_duration: default_raid_duration(),
            half_duration: default_half_duration(),
            interval_duration: default_interval_duration(),
            timeout_duration: default_timeout_duration(),
            max_timeouts: default_max_timeouts(),
            sync_interval: default_sync_interval(),
        }
    }
}

/// Audio cue settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct AudioConfig {
    /// Suppress every cue.
    #[serde(default)]
    pub muted: bool,
}

impl AudioConfig {
    /// Override `muted` with `RAIDLINE_AUDIO_MUTED` when set.
    ///
    /// Accepts `1`/`true` and `0`/`false`; other values are ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("RAIDLINE_AUDIO_MUTED") {
            match val.trim().to_ascii_lowercase().as_str() {
                "1" | "true" => self.muted = true,
                "0" | "false" => self.muted = false,
                _ => {}
            }
        }
    }
}

/// Tie-breaker settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct TieBreakerConfig {
    /// Seed for the golden-raid coin flip. Entropy-seeded when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

const fn default_raid_duration() -> u32 {
    30
}

const fn default_half_duration() -> u32 {
    1200
}

const fn default_interval_duration() -> u32 {
    300
}

const fn default_timeout_duration() -> u32 {
    60
}

const fn default_max_timeouts() -> u8 {
    2
}

const fn default_sync_interval() -> u32 {
    10
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = EngineConfig::default();
        assert_eq!(config.timers.raid_duration, 30);
        assert_eq!(config.timers.half_duration, 1200);
        assert_eq!(config.timers.interval_duration, 300);
        assert_eq!(config.timers.timeout_duration, 60);
        assert_eq!(config.timers.max_timeouts, 2);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
timers:
  raid_duration: 30
  half_duration: 900
  interval_duration: 120
  timeout_duration: 30
  max_timeouts: 1
  sync_interval: 5

audio:
  muted: false

tie_breaker:
  seed: 99

logging:
  level: "debug"
"#;

        let config = EngineConfig::parse(yaml);
        assert!(config.is_ok());
        let config = config.ok().unwrap_or_default();

        assert_eq!(config.timers.half_duration, 900);
        assert_eq!(config.timers.max_timeouts, 1);
        assert_eq!(config.timers.sync_interval, 5);
        assert_eq!(config.tie_breaker.seed, Some(99));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn parse_minimal_yaml() {
        let yaml = "timers:\n  half_duration: 600\n";
        let config = EngineConfig::parse(yaml);
        assert!(config.is_ok());
        let config = config.ok().unwrap_or_default();

        // Half length is overridden
        assert_eq!(config.timers.half_duration, 600);
        // Everything else uses defaults
        assert_eq!(config.timers.raid_duration, 30);
        assert_eq!(config.tie_breaker.seed, None);
    }

    #[test]
    fn parse_empty_yaml() {
        let config = EngineConfig::parse("");
        assert!(config.is_ok());
    }

    #[test]
    fn zero_duration_rejected() {
        let yaml = "timers:\n  raid_duration: 0\n";
        let result = EngineConfig::parse(yaml);
        assert!(matches!(
            result,
            Err(ConfigError::NonPositive {
                field: "timers.raid_duration"
            })
        ));
    }

    #[test]
    fn negative_duration_is_a_parse_error() {
        let yaml = "timers:\n  half_duration: -5\n";
        assert!(matches!(
            EngineConfig::parse(yaml),
            Err(ConfigError::Yaml { .. })
        ));
    }

    #[test]
    fn zero_timeout_allowance_rejected() {
        let yaml = "timers:\n  max_timeouts: 0\n";
        assert!(matches!(
            EngineConfig::parse(yaml),
            Err(ConfigError::NonPositive {
                field: "timers.max_timeouts"
            })
        ));
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("raidline-config.yaml");
        if path.exists() {
            let config = EngineConfig::from_file(&path);
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
        }
    }
}
