//! Path constants for configuration, theme and log files.

use std::path::PathBuf;

/// The name of the configuration directory under ~/.config/
pub const CONFIG_DIR_NAME: &str = "smart-mini-crt";

/// The name of the main configuration file
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// The name of the GUI theme stylesheet
pub const THEME_FILE_NAME: &str = "theme.css";

/// Directory under the cache dir holding resized artwork
pub const ARTWORK_DIR_NAME: &str = "artwork";

/// Get the configuration directory path (~/.config/smart-mini-crt/)
#[must_use]
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join(CONFIG_DIR_NAME)
}

/// Get the config file path (~/.config/smart-mini-crt/config.toml)
#[must_use]
pub fn config_path() -> PathBuf {
    config_dir().join(CONFIG_FILE_NAME)
}

/// Get the theme file path (~/.config/smart-mini-crt/theme.css)
#[must_use]
pub fn theme_path() -> PathBuf {
    config_dir().join(THEME_FILE_NAME)
}

/// Get the log file path for a service, e.g. `~/.cache/smart-mini-crt/crt-gui.log`
#[must_use]
pub fn log_file_path(service: &str) -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
        .join(format!("{service}.log"))
}

/// Get the artwork cache directory (~/.cache/smart-mini-crt/artwork/)
#[must_use]
pub fn artwork_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
        .join(ARTWORK_DIR_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_path_is_inside_config_dir() {
        assert!(config_path().starts_with(config_dir()));
        assert!(config_path().ends_with(CONFIG_FILE_NAME));
    }

    #[test]
    fn test_log_file_path_uses_service_name() {
        let path = log_file_path("crt-gui");
        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some("crt-gui.log")
        );
        assert!(path.parent().is_some_and(|p| p.ends_with(CONFIG_DIR_NAME)));
    }

    #[test]
    fn test_artwork_cache_dir_sits_next_to_logs() {
        assert_eq!(
            artwork_cache_dir().parent(),
            log_file_path("crt-gui").parent()
        );
    }
}
