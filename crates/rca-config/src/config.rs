//! Application configuration for recipe-agent.
//!
//! Everything here has a default, so a missing config file is not an error.
//! The API key is the only secret; it usually comes from `RCA_API_KEY`
//! rather than the file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::paths;

/// Environment variable that overrides `service.api_key`.
pub const API_KEY_ENV: &str = "RCA_API_KEY";
/// Environment variable that overrides `cache.dir`.
pub const CACHE_DIR_ENV: &str = "RCA_CACHE_DIR";

const DEFAULT_BASE_URL: &str = "http://api.wolframalpha.com/v1";
const DEFAULT_CONTINUATION_TEMPLATE: &str = "http://{host}/api/v1";
const DEFAULT_MAX_ATTEMPTS: u32 = 8;
const DEFAULT_MIN_DELAY_MS: u64 = 1_000;
const DEFAULT_MAX_DELAY_MS: u64 = 60_000;
const DEFAULT_MACHINE_CONCURRENCY: usize = 5;

/// Root of `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub runner: RunnerConfig,
}

/// Remote answering service settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Application id sent as `appid`.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Base URL for calls without a continuation host.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Template for continuation calls; `{host}` is replaced by the
    /// server-issued host.
    #[serde(default = "default_continuation_template")]
    pub continuation_url_template: String,
    /// Per-request timeout in seconds. None = no client-side timeout.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("continuation_url_template", &self.continuation_url_template)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            continuation_url_template: default_continuation_template(),
            timeout_secs: None,
        }
    }
}

impl ServiceConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Backoff settings for the retrying transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts including the first (default: 8).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            min_delay_ms: DEFAULT_MIN_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
        }
    }
}

impl RetryConfig {
    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms.max(self.min_delay_ms))
    }
}

/// Response cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cache directory. None = XDG state dir.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
        }
    }
}

impl CacheConfig {
    pub fn resolved_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(paths::default_cache_dir)
    }
}

/// Task runner settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Concurrency ceiling for machine-mode batches (default: 5).
    #[serde(default = "default_machine_concurrency")]
    pub machine_concurrency: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            machine_concurrency: DEFAULT_MACHINE_CONCURRENCY,
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_continuation_template() -> String {
    DEFAULT_CONTINUATION_TEMPLATE.to_string()
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_min_delay_ms() -> u64 {
    DEFAULT_MIN_DELAY_MS
}

fn default_max_delay_ms() -> u64 {
    DEFAULT_MAX_DELAY_MS
}

fn default_machine_concurrency() -> usize {
    DEFAULT_MACHINE_CONCURRENCY
}

fn default_true() -> bool {
    true
}

impl AppConfig {
    /// Load from the default location and apply environment overrides.
    ///
    /// Returns defaults if the file does not exist or the config directory
    /// cannot be determined (e.g., no HOME in containers).
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_path() {
            Some(path) => Self::load_from(&path)?,
            None => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from an explicit path. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        Ok(config)
    }

    /// Apply `RCA_API_KEY` / `RCA_CACHE_DIR` from the given lookup.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.service.api_key = Some(key.trim().to_string());
        }
        if let Some(dir) = lookup(CACHE_DIR_ENV).filter(|d| !d.trim().is_empty()) {
            self.cache.dir = Some(PathBuf::from(dir));
        }
    }

    /// Path to `~/.config/recipe-agent/config.toml`.
    pub fn config_path() -> Option<PathBuf> {
        paths::config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Default config TOML with comments, for users to copy.
    pub fn default_template() -> String {
        r#"# recipe-agent configuration
# Location: ~/.config/recipe-agent/config.toml

[service]
# api_key = "XXXXXX-XXXXXXXXXX"   # or export RCA_API_KEY
base_url = "http://api.wolframalpha.com/v1"
continuation_url_template = "http://{host}/api/v1"
# timeout_secs = 30

[retry]
max_attempts = 8     # total attempts including the first
min_delay_ms = 1000
max_delay_ms = 60000

[cache]
enabled = true
# dir = "/path/to/cache"          # or export RCA_CACHE_DIR

[runner]
machine_concurrency = 5
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.service.base_url, "http://api.wolframalpha.com/v1");
        assert_eq!(
            config.service.continuation_url_template,
            "http://{host}/api/v1"
        );
        assert!(config.service.api_key.is_none());
        assert_eq!(config.retry.max_attempts, 8);
        assert_eq!(config.retry.min_delay(), Duration::from_secs(1));
        assert!(config.cache.enabled);
        assert_eq!(config.runner.machine_concurrency, 5);
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&tmp.path().join("absent.toml")).unwrap();
        assert_eq!(config.retry.max_attempts, 8);
    }

    #[test]
    fn test_load_partial_file_fills_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[service]
api_key = "ABC-123"
timeout_secs = 12

[runner]
machine_concurrency = 2
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.service.api_key.as_deref(), Some("ABC-123"));
        assert_eq!(config.service.timeout(), Some(Duration::from_secs(12)));
        assert_eq!(config.service.base_url, "http://api.wolframalpha.com/v1");
        assert_eq!(config.runner.machine_concurrency, 2);
        assert_eq!(config.retry.max_attempts, 8);
    }

    #[test]
    fn test_load_invalid_toml_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[service\napi_key = ").unwrap();
        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse config"));
    }

    #[test]
    fn test_env_overrides_win_over_file() {
        let mut config = AppConfig::default();
        config.service.api_key = Some("from-file".into());

        let env: HashMap<&str, &str> =
            HashMap::from([(API_KEY_ENV, " from-env "), (CACHE_DIR_ENV, "/tmp/rca-cache")]);
        config.apply_env_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.service.api_key.as_deref(), Some("from-env"));
        assert_eq!(
            config.cache.resolved_dir(),
            PathBuf::from("/tmp/rca-cache")
        );
    }

    #[test]
    fn test_blank_env_override_is_ignored() {
        let mut config = AppConfig::default();
        config.service.api_key = Some("from-file".into());
        config.apply_env_overrides(|_| Some("   ".to_string()));
        assert_eq!(config.service.api_key.as_deref(), Some("from-file"));
        assert!(config.cache.dir.is_none());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let mut service = ServiceConfig::default();
        service.api_key = Some("super-secret".into());
        let rendered = format!("{service:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_max_delay_never_below_min() {
        let retry = RetryConfig {
            max_attempts: 3,
            min_delay_ms: 500,
            max_delay_ms: 100,
        };
        assert_eq!(retry.max_delay(), Duration::from_millis(500));
    }

    #[test]
    fn test_default_template_parses() {
        let config: AppConfig = toml::from_str(&AppConfig::default_template()).unwrap();
        assert_eq!(config.retry.max_attempts, 8);
        assert!(config.service.api_key.is_none());
    }
}
