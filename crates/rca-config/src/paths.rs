use std::path::PathBuf;

/// XDG app name used for config and state directories.
pub const APP_NAME: &str = "recipe-agent";

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", APP_NAME)
}

/// Directory holding `config.toml`.
pub fn config_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
}

/// State directory for persistent data such as the response cache.
///
/// Falls back to the local data dir on platforms without an XDG state dir
/// (e.g., macOS).
pub fn state_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| {
        dirs.state_dir()
            .unwrap_or_else(|| dirs.data_local_dir())
            .to_path_buf()
    })
}

/// Default location of the response cache.
pub fn default_cache_dir() -> PathBuf {
    state_dir()
        .unwrap_or_else(|| std::env::temp_dir().join(APP_NAME))
        .join("cache")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cache_dir_ends_with_cache() {
        let dir = default_cache_dir();
        assert!(dir.ends_with("cache"), "got {}", dir.display());
    }

    #[test]
    fn test_config_dir_mentions_app_name_when_available() {
        if let Some(dir) = config_dir() {
            assert!(
                dir.to_string_lossy().contains(APP_NAME),
                "got {}",
                dir.display()
            );
        }
    }
}
