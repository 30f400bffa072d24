//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `vesync-hub.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use serde::Deserialize;
use vesync_hub_adapter_vesync::VeSyncConfig;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Integration toggles.
    pub integrations: IntegrationsConfig,
    /// VeSync integration settings.
    pub vesync: VeSyncConfig,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Per-integration toggles.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct IntegrationsConfig {
    pub vesync_enabled: bool,
}

impl Config {
    /// Load configuration from `vesync-hub.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("vesync-hub.toml")?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("VESYNC_HUB_DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(val) = lookup("VESYNC_HUB_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = lookup("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = lookup("VESYNC_HUB_SNAPSHOT") {
            self.vesync.snapshot_path = val.into();
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.vesync.update_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "vesync.update_interval_secs must be non-zero".to_string(),
            ));
        }
        if self.vesync.discovery_capacity == 0 {
            return Err(ConfigError::Validation(
                "vesync.discovery_capacity must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:vesync-hub.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "vesync_hubd=info,vesync_hub=info".to_string(),
        }
    }
}

impl Default for IntegrationsConfig {
    fn default() -> Self {
        Self {
            vesync_enabled: true,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.database.url, "sqlite:vesync-hub.db?mode=rwc");
        assert!(config.integrations.vesync_enabled);
        assert_eq!(config.vesync.update_interval_secs, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.database_url(), "sqlite:vesync-hub.db?mode=rwc");
        assert_eq!(config.vesync.snapshot_path, PathBuf::from("vesync-devices.json"));
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [database]
            url = 'sqlite:test.db'

            [logging]
            filter = 'debug'

            [integrations]
            vesync_enabled = false

            [vesync]
            snapshot_path = '/etc/vesync/devices.json'
            update_interval_secs = 15
            discovery_capacity = 4
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.database.url, "sqlite:test.db");
        assert_eq!(config.logging.filter, "debug");
        assert!(!config.integrations.vesync_enabled);
        assert_eq!(
            config.vesync.snapshot_path,
            PathBuf::from("/etc/vesync/devices.json")
        );
        assert_eq!(config.vesync.update_interval_secs, 15);
        assert_eq!(config.vesync.discovery_capacity, 4);
    }

    #[test]
    fn should_parse_partial_toml_with_defaults() {
        let toml = "
            [vesync]
            update_interval_secs = 30
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.vesync.update_interval_secs, 30);
        assert_eq!(config.vesync.discovery_capacity, 16);
        assert!(config.integrations.vesync_enabled);
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.vesync.update_interval_secs, 60);
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }

    #[test]
    fn should_apply_overrides_with_rust_log_last() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("VESYNC_HUB_DATABASE_URL", "sqlite::memory:"),
            ("VESYNC_HUB_LOG", "warn"),
            ("RUST_LOG", "trace"),
            ("VESYNC_HUB_SNAPSHOT", "/tmp/devices.json"),
        ]);
        let mut config = Config::default();

        config.apply_overrides(|key| env.get(key).map(ToString::to_string));

        assert_eq!(config.database_url(), "sqlite::memory:");
        assert_eq!(config.logging.filter, "trace");
        assert_eq!(config.vesync.snapshot_path, PathBuf::from("/tmp/devices.json"));
    }

    #[test]
    fn should_keep_file_values_without_overrides() {
        let mut config = Config::default();
        config.apply_overrides(|_| None);
        assert_eq!(config.logging.filter, "vesync_hubd=info,vesync_hub=info");
    }

    #[test]
    fn should_reject_zero_update_interval() {
        let mut config = Config::default();
        config.vesync.update_interval_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn should_reject_zero_discovery_capacity() {
        let mut config = Config::default();
        config.vesync.discovery_capacity = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }
}
