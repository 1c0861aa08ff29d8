//! Tracker configuration.

use thiserror::Error;

/// Speaker alias used for tracker whispers.
pub const DEFAULT_SPEAKER_ALIAS: &str = "Ammo Tracker";

/// Label of the recovery call-to-action.
pub const DEFAULT_RECOVER_LABEL: &str = "Recover Ammo";

/// Line separating items in the end-of-combat summary.
pub const DEFAULT_DIVIDER: &str = "---";

/// Errors from reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid fan-out mode '{0}', expected 'concurrent' or 'sequential'")]
    InvalidFanout(String),
}

/// How per-actor work is scheduled during a fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Fanout {
    /// All actors are processed at once.
    #[default]
    Concurrent,
    /// Actors are processed one after another, in tracking order.
    Sequential,
}

impl std::str::FromStr for Fanout {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "concurrent" => Ok(Fanout::Concurrent),
            "sequential" => Ok(Fanout::Sequential),
            other => Err(ConfigError::InvalidFanout(other.to_string())),
        }
    }
}

/// Configuration for the ammo tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Alias tracker whispers are sent under.
    pub speaker_alias: String,

    /// Label of the "recover" action attached to spent-ammo summaries.
    pub recover_label: String,

    /// Divider between items in a spent-ammo summary.
    pub divider: String,

    /// Scheduling of per-actor work.
    pub fanout: Fanout,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            speaker_alias: DEFAULT_SPEAKER_ALIAS.to_string(),
            recover_label: DEFAULT_RECOVER_LABEL.to_string(),
            divider: DEFAULT_DIVIDER.to_string(),
            fanout: Fanout::default(),
        }
    }
}

impl TrackerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a config from `AMMO_TRACKER_*` environment variables.
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(alias) = std::env::var("AMMO_TRACKER_ALIAS") {
            config.speaker_alias = alias;
        }
        if let Ok(label) = std::env::var("AMMO_TRACKER_RECOVER_LABEL") {
            config.recover_label = label;
        }
        if let Ok(fanout) = std::env::var("AMMO_TRACKER_FANOUT") {
            config.fanout = fanout.parse()?;
        }

        Ok(config)
    }

    /// Set the speaker alias.
    pub fn with_speaker_alias(mut self, alias: impl Into<String>) -> Self {
        self.speaker_alias = alias.into();
        self
    }

    /// Set the recover action label.
    pub fn with_recover_label(mut self, label: impl Into<String>) -> Self {
        self.recover_label = label.into();
        self
    }

    /// Set the item divider.
    pub fn with_divider(mut self, divider: impl Into<String>) -> Self {
        self.divider = divider.into();
        self
    }

    /// Set the fan-out mode.
    pub fn with_fanout(mut self, fanout: Fanout) -> Self {
        self.fanout = fanout;
        self
    }
}
