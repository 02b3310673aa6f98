use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const CONFIG_DIR: &str = "inputlayer";
const CONFIG_FILE: &str = "config.toml";
const MAX_STATS_INTERVAL_SECS: u64 = 86_400;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid setting: {0}")]
    Invalid(String),
}

/// Runtime settings for the dispatcher and its event queue.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct DispatcherSettings {
    /// Forwarded to the gesture recognizer.
    pub long_press_enabled: bool,
    /// Multi-finger pan and scale; may interfere with raw multi-touch.
    pub panning_and_scaling_enabled: bool,
    /// Capacity of the host event queue feeding the dispatcher task.
    pub queue_capacity: usize,
    /// Interval between queue throughput log lines.
    pub stats_interval_secs: u64,
    pub log_level: String,
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            long_press_enabled: false,
            panning_and_scaling_enabled: false,
            queue_capacity: 1000,
            stats_interval_secs: 10,
            log_level: "info".to_string(),
        }
    }
}

impl DispatcherSettings {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "queue_capacity must be at least 1".to_string(),
            ));
        }
        if self.stats_interval_secs == 0 || self.stats_interval_secs > MAX_STATS_INTERVAL_SECS {
            return Err(ConfigError::Invalid(format!(
                "stats_interval_secs must be between 1 and {}",
                MAX_STATS_INTERVAL_SECS
            )));
        }
        Ok(())
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            warn!(
                "Config file {} does not exist, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_toml(&content)?;
        info!("Loaded dispatcher settings from {}", path.display());
        debug!("Settings: {:?}", settings);
        Ok(settings)
    }

    /// Load from the platform config directory.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&default_config_path())
    }
}

/// `<config dir>/inputlayer/config.toml`.
pub fn default_config_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| {
        warn!("Could not determine config directory, using current directory");
        PathBuf::from(".")
    });
    path.push(CONFIG_DIR);
    path.push(CONFIG_FILE);
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_take_defaults() {
        let settings = DispatcherSettings::from_toml("long_press_enabled = true\n").unwrap();
        assert!(settings.long_press_enabled);
        assert!(!settings.panning_and_scaling_enabled);
        assert_eq!(settings.queue_capacity, 1000);
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = DispatcherSettings::from_toml("queue_capacity = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn stats_interval_is_bounded() {
        let err = DispatcherSettings::from_toml("stats_interval_secs = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        let err =
            DispatcherSettings::from_toml("stats_interval_secs = 9223372036854775807\n")
                .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        let settings = DispatcherSettings::from_toml("stats_interval_secs = 86400\n").unwrap();
        assert_eq!(settings.stats_interval_secs, 86_400);
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = DispatcherSettings::from_toml("queue_capacity = \"lots\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_from_file_and_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);

        assert_eq!(
            DispatcherSettings::load_from(&path).unwrap(),
            DispatcherSettings::default()
        );

        std::fs::write(
            &path,
            "panning_and_scaling_enabled = true\nstats_interval_secs = 30\n",
        )
        .unwrap();
        let settings = DispatcherSettings::load_from(&path).unwrap();
        assert!(settings.panning_and_scaling_enabled);
        assert_eq!(settings.stats_interval_secs, 30);
    }

    #[test]
    fn default_path_ends_with_crate_dir() {
        let path = default_config_path();
        assert!(path.ends_with("inputlayer/config.toml"));
    }
}
