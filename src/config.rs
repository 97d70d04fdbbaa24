use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ClauderConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub limits: LimitsConfig,
    pub instances: InstancesConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
    /// How long a writer waits on another process's lock before failing.
    pub busy_timeout_ms: u64,
}

/// Input bounds enforced by the tool handlers before anything reaches the store.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum fact content size in bytes.
    pub max_fact_size: usize,
    pub max_tag_count: usize,
    /// Maximum tag length in characters.
    pub max_tag_length: usize,
    /// Maximum message content size in bytes.
    pub max_message_size: usize,
    /// Row limit used by `recall` when the caller does not pass one.
    pub recall_default_limit: i64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct InstancesConfig {
    pub stale_after_secs: u64,
    pub heartbeat_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_clauder_dir()
            .join("clauder.db")
            .to_string_lossy()
            .into_owned();
        Self {
            db_path,
            busy_timeout_ms: 5000,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_fact_size: 10_000,
            max_tag_count: 20,
            max_tag_length: 50,
            max_message_size: 10_000,
            recall_default_limit: 20,
        }
    }
}

impl Default for InstancesConfig {
    fn default() -> Self {
        Self {
            stale_after_secs: 300,
            heartbeat_interval_secs: 30,
        }
    }
}

impl StorageConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

impl InstancesConfig {
    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs.max(1))
    }
}

/// Returns `~/.clauder/`
pub fn default_clauder_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".clauder")
}

/// Returns the default config file path: `~/.clauder/config.toml`
pub fn default_config_path() -> PathBuf {
    default_clauder_dir().join("config.toml")
}

impl ClauderConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            ClauderConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (CLAUDER_DB, CLAUDER_LOG_LEVEL).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("CLAUDER_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("CLAUDER_LOG_LEVEL") {
            self.server.log_level = val;
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ClauderConfig::default();
        assert_eq!(config.server.log_level, "info");
        assert_eq!(config.storage.busy_timeout_ms, 5000);
        assert_eq!(config.limits.recall_default_limit, 20);
        assert_eq!(config.instances.stale_after(), Duration::from_secs(300));
        assert_eq!(config.instances.heartbeat_interval(), Duration::from_secs(30));
        assert!(config.storage.db_path.ends_with("clauder.db"));
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[server]
log_level = "debug"

[storage]
db_path = "/tmp/test.db"

[limits]
max_fact_size = 2048
max_tag_count = 5
"#;
        let config: ClauderConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.log_level, "debug");
        assert_eq!(config.storage.db_path, "/tmp/test.db");
        assert_eq!(config.limits.max_fact_size, 2048);
        assert_eq!(config.limits.max_tag_count, 5);
        // defaults still apply for unset fields
        assert_eq!(config.limits.max_tag_length, 50);
        assert_eq!(config.storage.busy_timeout_ms, 5000);
        assert_eq!(config.instances.stale_after_secs, 300);
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = ClauderConfig::default();
        std::env::set_var("CLAUDER_DB", "/tmp/override.db");
        std::env::set_var("CLAUDER_LOG_LEVEL", "trace");

        config.apply_env_overrides();

        assert_eq!(config.storage.db_path, "/tmp/override.db");
        assert_eq!(config.server.log_level, "trace");

        std::env::remove_var("CLAUDER_DB");
        std::env::remove_var("CLAUDER_LOG_LEVEL");
    }

    #[test]
    fn zero_heartbeat_interval_is_clamped() {
        let instances = InstancesConfig {
            stale_after_secs: 300,
            heartbeat_interval_secs: 0,
        };
        assert_eq!(instances.heartbeat_interval(), Duration::from_secs(1));
    }

    #[test]
    fn tilde_expands_to_home() {
        let expanded = expand_tilde("~/data/clauder.db");
        assert!(expanded.ends_with("data/clauder.db"));
        assert_eq!(expand_tilde("/abs/path.db"), PathBuf::from("/abs/path.db"));
    }
}
