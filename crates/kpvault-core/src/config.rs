//! Configuration module for kpvault.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.
//! Command-line flags are applied on top through [`ConfigBuilder`], and the
//! resulting [`Config`] is treated as immutable for the rest of the run.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Vault address used when neither the config file nor `VAULT_ADDR` sets one.
pub const DEFAULT_VAULT_ADDR: &str = "https://127.0.0.1:8200";

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for kpvault.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub vault: VaultConfig,
    pub filters: FilterConfig,
    pub sync: SyncConfig,
    pub logging: LoggingConfig,
}

/// Source database settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Path to the KeePass database (or YAML export).
    pub input: PathBuf,
}

/// Target secret store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Base address of the Vault server.
    pub address: String,
    /// KV v1 mount that receives the secrets.
    pub mount: String,
    /// Milliseconds allowed for each list, put, or delete call.
    pub timeout_ms: u64,
}

/// Entry selection settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Only migrate entries carrying this tag.
    pub tag: Option<String>,
    /// Skip entries whose store key matches any of these regular expressions.
    pub exclude_paths: Vec<String>,
}

/// Reconciliation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Delete secrets that no longer exist in the source.
    pub delete: bool,
    /// Seconds between progress log lines.
    pub progress_interval_secs: u64,
    /// Base delay in milliseconds between write attempts (doubled per attempt).
    pub retry_delay_ms: u64,
    /// Capacity of the walker → engine channel.
    pub channel_capacity: usize,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
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
    /// Typically `$XDG_CONFIG_HOME/kpvault/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("kpvault")
            .join("config.yaml")
    }
}

impl VaultConfig {
    /// Per-operation timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl SyncConfig {
    pub fn progress_interval(&self) -> Duration {
        Duration::from_secs(self.progress_interval_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("example.kdbx"),
        }
    }
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_VAULT_ADDR.to_string(),
            mount: "password".to_string(),
            timeout_ms: 5_000,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            delete: false,
            progress_interval_secs: 2,
            retry_delay_ms: 0,
            channel_capacity: 256,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"vault.mount"`.
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

        // --- source ---
        if self.source.input.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "source.input".into(),
                message: "must not be empty".into(),
            });
        }

        // --- vault ---
        if !(self.vault.address.starts_with("http://") || self.vault.address.starts_with("https://"))
        {
            errors.push(ValidationError {
                field: "vault.address".into(),
                message: format!("must be an http(s) URL, got '{}'", self.vault.address),
            });
        }
        if self.vault.mount.trim_matches('/').is_empty() {
            errors.push(ValidationError {
                field: "vault.mount".into(),
                message: "must not be empty".into(),
            });
        }
        if self.vault.timeout_ms == 0 {
            errors.push(ValidationError {
                field: "vault.timeout_ms".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- filters ---
        for pattern in &self.filters.exclude_paths {
            if let Err(err) = regex::Regex::new(pattern) {
                errors.push(ValidationError {
                    field: "filters.exclude_paths".into(),
                    message: format!("invalid pattern '{pattern}': {err}"),
                });
            }
        }

        // --- sync ---
        if self.sync.progress_interval_secs == 0 {
            errors.push(ValidationError {
                field: "sync.progress_interval_secs".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.sync.channel_capacity == 0 {
            errors.push(ValidationError {
                field: "sync.channel_capacity".into(),
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

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] (or a loaded file) and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use kpvault_core::config::ConfigBuilder;
/// use std::path::PathBuf;
///
/// let config = ConfigBuilder::new()
///     .source_input(PathBuf::from("vault.kdbx"))
///     .vault_mount("secret")
///     .sync_delete(true)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Create a builder that starts from an existing configuration.
    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    // --- source ---

    pub fn source_input(mut self, input: PathBuf) -> Self {
        self.config.source.input = input;
        self
    }

    // --- vault ---

    pub fn vault_address(mut self, address: impl Into<String>) -> Self {
        self.config.vault.address = address.into();
        self
    }

    pub fn vault_mount(mut self, mount: impl Into<String>) -> Self {
        self.config.vault.mount = mount.into();
        self
    }

    pub fn vault_timeout(mut self, timeout: Duration) -> Self {
        self.config.vault.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    // --- filters ---

    /// Sets the required tag; an empty string clears the filter.
    pub fn filters_tag(mut self, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        self.config.filters.tag = if tag.is_empty() { None } else { Some(tag) };
        self
    }

    pub fn filters_exclude_path(mut self, pattern: impl Into<String>) -> Self {
        self.config.filters.exclude_paths.push(pattern.into());
        self
    }

    // --- sync ---

    pub fn sync_delete(mut self, delete: bool) -> Self {
        self.config.sync.delete = delete;
        self
    }

    pub fn sync_progress_interval_secs(mut self, seconds: u64) -> Self {
        self.config.sync.progress_interval_secs = seconds;
        self
    }

    pub fn sync_retry_delay_ms(mut self, millis: u64) -> Self {
        self.config.sync.retry_delay_ms = millis;
        self
    }

    pub fn sync_channel_capacity(mut self, capacity: usize) -> Self {
        self.config.sync.channel_capacity = capacity;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
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

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    // -- Defaults --

    #[test]
    fn default_config_has_sensible_values() {
        let cfg = Config::default();
        assert_eq!(cfg.source.input, PathBuf::from("example.kdbx"));
        assert_eq!(cfg.vault.address, DEFAULT_VAULT_ADDR);
        assert_eq!(cfg.vault.mount, "password");
        assert_eq!(cfg.vault.timeout(), Duration::from_secs(5));
        assert!(cfg.filters.tag.is_none());
        assert!(cfg.filters.exclude_paths.is_empty());
        assert!(!cfg.sync.delete);
        assert_eq!(cfg.sync.progress_interval(), Duration::from_secs(2));
        assert_eq!(cfg.sync.retry_delay(), Duration::ZERO);
        assert_eq!(cfg.sync.channel_capacity, 256);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn default_config_passes_validation() {
        let errors = Config::default().validate();
        assert!(errors.is_empty(), "unexpected validation errors: {errors:?}");
    }

    // -- Loading --

    #[test]
    fn load_from_yaml_file() {
        let yaml = r#"
source:
  input: /tmp/passwords.kdbx
vault:
  address: http://vault.internal:8200
  mount: secret/team
  timeout_ms: 10000
filters:
  tag: vault
  exclude_paths:
    - "^Recycle_Bin/"
    - "^Personal/"
sync:
  delete: true
  progress_interval_secs: 5
  retry_delay_ms: 100
  channel_capacity: 64
logging:
  level: debug
"#;
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        tmp.write_all(yaml.as_bytes()).unwrap();
        tmp.flush().unwrap();

        let cfg = Config::load(tmp.path()).expect("load config");
        assert_eq!(cfg.source.input, PathBuf::from("/tmp/passwords.kdbx"));
        assert_eq!(cfg.vault.address, "http://vault.internal:8200");
        assert_eq!(cfg.vault.mount, "secret/team");
        assert_eq!(cfg.vault.timeout(), Duration::from_secs(10));
        assert_eq!(cfg.filters.tag.as_deref(), Some("vault"));
        assert_eq!(cfg.filters.exclude_paths.len(), 2);
        assert!(cfg.sync.delete);
        assert_eq!(cfg.sync.progress_interval_secs, 5);
        assert_eq!(cfg.sync.retry_delay_ms, 100);
        assert_eq!(cfg.sync.channel_capacity, 64);
        assert_eq!(cfg.logging.level, "debug");
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        tmp.write_all(b"vault:\n  mount: kv\n").unwrap();
        tmp.flush().unwrap();

        let cfg = Config::load(tmp.path()).expect("load config");
        assert_eq!(cfg.vault.mount, "kv");
        assert_eq!(cfg.vault.timeout_ms, 5_000);
        assert_eq!(cfg.sync.channel_capacity, 256);
    }

    #[test]
    fn load_or_default_returns_default_on_missing_file() {
        let cfg = Config::load_or_default(Path::new("/nonexistent/config.yaml"));
        assert_eq!(cfg.vault.mount, "password");
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
    fn validate_catches_zero_timeout() {
        let mut cfg = Config::default();
        cfg.vault.timeout_ms = 0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "vault.timeout_ms"));
    }

    #[test]
    fn validate_catches_empty_mount() {
        let mut cfg = Config::default();
        cfg.vault.mount = "/".to_string();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "vault.mount"));
    }

    #[test]
    fn validate_catches_bad_address() {
        let mut cfg = Config::default();
        cfg.vault.address = "vault.internal:8200".to_string();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "vault.address"));
    }

    #[test]
    fn validate_catches_invalid_exclude_pattern() {
        let mut cfg = Config::default();
        cfg.filters.exclude_paths.push("(unclosed".to_string());
        let errors = cfg.validate();
        assert!(errors.iter().any(
            |e| e.field == "filters.exclude_paths" && e.message.contains("(unclosed")
        ));
    }

    #[test]
    fn validate_accepts_empty_tag_as_no_filter() {
        let mut cfg = Config::default();
        cfg.filters.tag = Some(String::new());
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn validate_catches_zero_sync_values() {
        let mut cfg = Config::default();
        cfg.sync.progress_interval_secs = 0;
        cfg.sync.channel_capacity = 0;
        let errors = cfg.validate();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"sync.progress_interval_secs"));
        assert!(fields.contains(&"sync.channel_capacity"));
    }

    #[test]
    fn validate_accepts_all_valid_log_levels() {
        for level in VALID_LOG_LEVELS {
            let mut cfg = Config::default();
            cfg.logging.level = level.to_string();
            let errors = cfg.validate();
            assert!(
                !errors.iter().any(|e| e.field == "logging.level"),
                "level '{level}' should be valid"
            );
        }
    }

    #[test]
    fn validate_catches_invalid_log_level() {
        let mut cfg = Config::default();
        cfg.logging.level = "verbose".to_string();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "logging.level"));
    }

    // -- Builder --

    #[test]
    fn builder_overrides_fields() {
        let cfg = ConfigBuilder::new()
            .source_input(PathBuf::from("/data/team.kdbx"))
            .vault_address("http://127.0.0.1:8200")
            .vault_mount("kv")
            .vault_timeout(Duration::from_millis(1500))
            .filters_tag("vault")
            .filters_exclude_path("^Recycle_Bin/")
            .sync_delete(true)
            .sync_progress_interval_secs(10)
            .sync_retry_delay_ms(50)
            .sync_channel_capacity(8)
            .logging_level("trace")
            .build();

        assert_eq!(cfg.source.input, PathBuf::from("/data/team.kdbx"));
        assert_eq!(cfg.vault.address, "http://127.0.0.1:8200");
        assert_eq!(cfg.vault.mount, "kv");
        assert_eq!(cfg.vault.timeout_ms, 1500);
        assert_eq!(cfg.filters.tag.as_deref(), Some("vault"));
        assert_eq!(cfg.filters.exclude_paths, vec!["^Recycle_Bin/".to_string()]);
        assert!(cfg.sync.delete);
        assert_eq!(cfg.sync.progress_interval_secs, 10);
        assert_eq!(cfg.sync.retry_delay_ms, 50);
        assert_eq!(cfg.sync.channel_capacity, 8);
        assert_eq!(cfg.logging.level, "trace");
    }

    #[test]
    fn builder_empty_tag_clears_filter() {
        let cfg = ConfigBuilder::new().filters_tag("vault").filters_tag("").build();
        assert!(cfg.filters.tag.is_none());
    }

    #[test]
    fn builder_from_config_keeps_file_values() {
        let mut base = Config::default();
        base.vault.mount = "from-file".to_string();
        let cfg = ConfigBuilder::from_config(base).sync_delete(true).build();
        assert_eq!(cfg.vault.mount, "from-file");
        assert!(cfg.sync.delete);
    }

    #[test]
    fn builder_build_validated_fails_for_invalid_config() {
        let result = ConfigBuilder::new()
            .vault_timeout(Duration::ZERO)
            .logging_level("nope")
            .build_validated();
        let errors = result.unwrap_err();
        assert!(errors.len() >= 2);
    }

    #[test]
    fn default_path_ends_with_config_yaml() {
        let p = Config::default_path();
        assert!(p.ends_with("kpvault/config.yaml"));
    }

    #[test]
    fn validation_error_display() {
        let err = ValidationError {
            field: "vault.mount".into(),
            message: "must not be empty".into(),
        };
        assert_eq!(err.to_string(), "vault.mount: must not be empty");
    }
}
