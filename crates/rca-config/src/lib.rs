//! Configuration loading (`~/.config/recipe-agent/config.toml`) and XDG paths.

pub mod config;
pub mod paths;

pub use config::{
    API_KEY_ENV, AppConfig, CACHE_DIR_ENV, CacheConfig, RetryConfig, RunnerConfig, ServiceConfig,
};
