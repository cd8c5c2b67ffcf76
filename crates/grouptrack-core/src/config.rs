//! Configuration module for GroupTrack.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for GroupTrack.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub snapshots: SnapshotsConfig,
    pub tracking: TrackingConfig,
    pub notifications: NotificationsConfig,
    pub storage: StorageConfig,
    pub watch: WatchConfig,
    pub logging: LoggingConfig,
}

/// Where snapshot files are published.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotsConfig {
    /// Directory containing one `<group>.json` file per group.
    pub directory: PathBuf,
}

/// Membership tracking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Grace period in minutes during which a departed member reappearing
    /// elsewhere is reported as a group change rather than a fresh join.
    pub group_change_time: u64,
}

/// Outbound notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    /// Webhook URL. `None` logs notifications instead of posting them.
    pub webhook_url: Option<String>,
    /// Role id mentioned at the top of group-change alerts.
    pub alert_role: Option<String>,
    /// Upper bound on webhook deliveries per minute.
    pub requests_per_minute: u32,
    /// HTTP timeout for a single delivery, in seconds.
    pub timeout_secs: u64,
}

/// Where the membership indexes are persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding `groupStore.json` and `userStore.json`.
    pub state_dir: PathBuf,
}

/// Filesystem watch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Milliseconds a snapshot file must be quiet before it is processed.
    pub debounce_ms: u64,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    /// Emit JSON log lines instead of human-readable ones.
    pub json: bool,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/grouptrack/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("grouptrack")
            .join("config.yaml")
    }

    /// The grace period as a [`Duration`].
    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.tracking.group_change_time.saturating_mul(60))
    }

    /// The watch debounce window as a [`Duration`].
    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.watch.debounce_ms)
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

// Config derives Default because all its fields implement Default.

impl Default for SnapshotsConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./groups"),
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            group_change_time: 5,
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            alert_role: None,
            requests_per_minute: 30,
            timeout_secs: 10,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_dir: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("~/.local/share"))
                .join("grouptrack"),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { debounce_ms: 500 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"tracking.group_change_time"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- snapshots ---
        if self.snapshots.directory.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "snapshots.directory".into(),
                message: "must not be empty".into(),
            });
        } else if !self.snapshots.directory.is_dir() {
            errors.push(ValidationError {
                field: "snapshots.directory".into(),
                message: format!(
                    "directory does not exist: {}",
                    self.snapshots.directory.display()
                ),
            });
        }

        // --- tracking ---
        if self.tracking.group_change_time == 0 {
            errors.push(ValidationError {
                field: "tracking.group_change_time".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- notifications ---
        if let Some(url) = &self.notifications.webhook_url {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                errors.push(ValidationError {
                    field: "notifications.webhook_url".into(),
                    message: format!("must be an http(s) URL, got '{url}'"),
                });
            }
        }
        if self.notifications.requests_per_minute == 0 {
            errors.push(ValidationError {
                field: "notifications.requests_per_minute".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.notifications.timeout_secs == 0 {
            errors.push(ValidationError {
                field: "notifications.timeout_secs".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- storage ---
        if self.storage.state_dir.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "storage.state_dir".into(),
                message: "must not be empty".into(),
            });
        }

        // --- watch ---
        if self.watch.debounce_ms == 0 {
            errors.push(ValidationError {
                field: "watch.debounce_ms".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for [`Config`].
///
/// ```
/// use grouptrack_core::config::ConfigBuilder;
/// use std::path::PathBuf;
///
/// let cfg = ConfigBuilder::new()
///     .snapshots_directory(PathBuf::from("/srv/groups"))
///     .group_change_time(10)
///     .alert_role("123456")
///     .build();
///
/// assert_eq!(cfg.tracking.group_change_time, 10);
/// ```
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- snapshots ---

    pub fn snapshots_directory(mut self, directory: PathBuf) -> Self {
        self.config.snapshots.directory = directory;
        self
    }

    // --- tracking ---

    pub fn group_change_time(mut self, minutes: u64) -> Self {
        self.config.tracking.group_change_time = minutes;
        self
    }

    // --- notifications ---

    pub fn webhook_url(mut self, url: impl Into<String>) -> Self {
        self.config.notifications.webhook_url = Some(url.into());
        self
    }

    pub fn alert_role(mut self, role: impl Into<String>) -> Self {
        self.config.notifications.alert_role = Some(role.into());
        self
    }

    pub fn requests_per_minute(mut self, n: u32) -> Self {
        self.config.notifications.requests_per_minute = n;
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.notifications.timeout_secs = secs;
        self
    }

    // --- storage ---

    pub fn state_dir(mut self, dir: PathBuf) -> Self {
        self.config.storage.state_dir = dir;
        self
    }

    // --- watch ---

    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.config.watch.debounce_ms = ms;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn logging_json(mut self, json: bool) -> Self {
        self.config.logging.json = json;
        self
    }

    /// Consume the builder and return the [`Config`] without validation.
    pub fn build(self) -> Config {
        self.config
    }

    /// Consume the builder, validate, and return the [`Config`] or errors.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let errors = self.config.validate();
        if errors.is_empty() {
            Ok(self.config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    // -- Defaults --

    #[test]
    fn default_config_has_sensible_values() {
        let cfg = Config::default();
        assert_eq!(cfg.tracking.group_change_time, 5);
        assert_eq!(cfg.grace_period(), Duration::from_secs(300));
        assert_eq!(cfg.watch.debounce_ms, 500);
        assert_eq!(cfg.notifications.requests_per_minute, 30);
        assert!(cfg.notifications.webhook_url.is_none());
        assert_eq!(cfg.logging.level, "info");
        assert!(cfg.storage.state_dir.ends_with("grouptrack"));
    }

    #[test]
    fn default_config_passes_validation_apart_from_directory() {
        let cfg = Config::default();
        let errors = cfg.validate();
        // ./groups may not exist where tests run, filter that out
        let other: Vec<_> = errors
            .iter()
            .filter(|e| e.field != "snapshots.directory")
            .collect();
        assert!(other.is_empty(), "unexpected validation errors: {other:?}");
    }

    // -- Loading --

    #[test]
    fn load_from_yaml_file() {
        let yaml = r#"
snapshots:
  directory: /srv/groups
tracking:
  group_change_time: 15
notifications:
  webhook_url: "https://discord.com/api/webhooks/1/abc"
  alert_role: "998877"
  requests_per_minute: 20
  timeout_secs: 5
storage:
  state_dir: /var/lib/grouptrack
watch:
  debounce_ms: 250
logging:
  level: debug
  json: true
"#;
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        tmp.write_all(yaml.as_bytes()).unwrap();
        tmp.flush().unwrap();

        let cfg = Config::load(tmp.path()).expect("load config");
        assert_eq!(cfg.snapshots.directory, PathBuf::from("/srv/groups"));
        assert_eq!(cfg.tracking.group_change_time, 15);
        assert_eq!(
            cfg.notifications.webhook_url.as_deref(),
            Some("https://discord.com/api/webhooks/1/abc")
        );
        assert_eq!(cfg.notifications.alert_role.as_deref(), Some("998877"));
        assert_eq!(cfg.notifications.requests_per_minute, 20);
        assert_eq!(cfg.notifications.timeout_secs, 5);
        assert_eq!(cfg.storage.state_dir, PathBuf::from("/var/lib/grouptrack"));
        assert_eq!(cfg.debounce_delay(), Duration::from_millis(250));
        assert_eq!(cfg.logging.level, "debug");
        assert!(cfg.logging.json);
    }

    #[test]
    fn load_partial_yaml_fills_defaults() {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        tmp.write_all(b"tracking:\n  group_change_time: 2\n").unwrap();
        tmp.flush().unwrap();

        let cfg = Config::load(tmp.path()).expect("load config");
        assert_eq!(cfg.tracking.group_change_time, 2);
        assert_eq!(cfg.watch.debounce_ms, 500);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn load_or_default_returns_default_on_missing_file() {
        let cfg = Config::load_or_default(Path::new("/nonexistent/config.yaml"));
        assert_eq!(cfg.tracking.group_change_time, 5);
    }

    #[test]
    fn load_returns_error_on_invalid_yaml() {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        tmp.write_all(b"not: [valid: yaml: {{{").unwrap();
        tmp.flush().unwrap();

        assert!(Config::load(tmp.path()).is_err());
    }

    // -- Validation --

    #[test]
    fn validate_catches_zero_group_change_time() {
        let mut cfg = Config::default();
        cfg.tracking.group_change_time = 0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "tracking.group_change_time"));
    }

    #[test]
    fn validate_catches_bad_webhook_url() {
        let mut cfg = Config::default();
        cfg.notifications.webhook_url = Some("discord.com/hook".into());
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "notifications.webhook_url"));
    }

    #[test]
    fn validate_catches_zero_notification_limits() {
        let mut cfg = Config::default();
        cfg.notifications.requests_per_minute = 0;
        cfg.notifications.timeout_secs = 0;
        let fields: Vec<String> = cfg.validate().into_iter().map(|e| e.field).collect();
        assert!(fields.contains(&"notifications.requests_per_minute".to_string()));
        assert!(fields.contains(&"notifications.timeout_secs".to_string()));
    }

    #[test]
    fn validate_catches_zero_debounce() {
        let mut cfg = Config::default();
        cfg.watch.debounce_ms = 0;
        assert!(cfg.validate().iter().any(|e| e.field == "watch.debounce_ms"));
    }

    #[test]
    fn validate_catches_invalid_log_level() {
        let mut cfg = Config::default();
        cfg.logging.level = "verbose".into();
        let errors = cfg.validate();
        let err = errors.iter().find(|e| e.field == "logging.level").unwrap();
        assert!(err.message.contains("verbose"));
    }

    #[test]
    fn validate_catches_missing_snapshot_directory() {
        let cfg = ConfigBuilder::new()
            .snapshots_directory(PathBuf::from("/nonexistent/groups"))
            .build();
        assert!(cfg
            .validate()
            .iter()
            .any(|e| e.field == "snapshots.directory"));
    }

    // -- Builder --

    #[test]
    fn builder_produces_valid_config() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = ConfigBuilder::new()
            .snapshots_directory(dir.path().to_path_buf())
            .state_dir(dir.path().join("state"))
            .group_change_time(3)
            .webhook_url("https://example.com/hook")
            .alert_role("42")
            .requests_per_minute(10)
            .timeout_secs(3)
            .debounce_ms(100)
            .logging_level("warn")
            .logging_json(true)
            .build_validated()
            .expect("valid config");

        assert_eq!(cfg.grace_period(), Duration::from_secs(180));
        assert_eq!(cfg.notifications.alert_role.as_deref(), Some("42"));
        assert!(cfg.logging.json);
    }

    #[test]
    fn builder_validated_returns_errors() {
        let result = ConfigBuilder::new()
            .group_change_time(0)
            .logging_level("loud")
            .build_validated();
        let errors = result.unwrap_err();
        assert!(errors.iter().any(|e| e.field == "tracking.group_change_time"));
        assert!(errors.iter().any(|e| e.field == "logging.level"));
    }

    #[test]
    fn config_round_trips_through_yaml() {
        let cfg = ConfigBuilder::new().group_change_time(7).build();
        let yaml = serde_yaml::to_string(&cfg).unwrap();
        let back: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back.tracking.group_change_time, 7);
    }
}
