//! Theme CSS with hot reload.
//!
//! The embedded stylesheet is written to the config directory on first run.
//! After that the file on disk is the source of truth and edits show up on the
//! screen without a restart.

use dioxus::prelude::*;
use notify_debouncer_mini::notify::{self, RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, Debouncer};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("Failed to read theme file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to initialize file watcher: {0}")]
    WatcherError(#[from] notify::Error),
}

/// Embedded default CSS template (compiled into the binary)
const DEFAULT_CSS: &str = include_str!("../assets/default_theme.css");

/// Debounce window for editor save bursts
const RELOAD_DEBOUNCE: Duration = Duration::from_millis(300);

/// Read the theme at `theme_path`, writing the embedded default there first if
/// it doesn't exist.
///
/// # Errors
///
/// Returns an error if the file cannot be read, or created on first run.
pub fn initialize_theme_at(theme_path: &Path) -> Result<String, ThemeError> {
    if theme_path.exists() {
        info!("Loading theme from {:?}", theme_path);
        return Ok(fs::read_to_string(theme_path)?);
    }

    info!("Theme file not found, creating from template at {:?}", theme_path);
    if let Some(parent) = theme_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(theme_path, DEFAULT_CSS)?;

    Ok(DEFAULT_CSS.to_string())
}

/// Load CSS from `theme_path`, falling back to the embedded stylesheet.
#[must_use]
pub fn load_theme_css(theme_path: &Path) -> String {
    fs::read_to_string(theme_path).unwrap_or_else(|e| {
        warn!("Failed to read theme file, using embedded CSS: {}", e);
        DEFAULT_CSS.to_string()
    })
}

/// Watch the theme directory and send a unit on every debounced change.
fn watch_theme_dir(
    theme_path: &Path,
    tx: mpsc::Sender<()>,
) -> Result<Debouncer<RecommendedWatcher>, ThemeError> {
    let mut debouncer = new_debouncer(RELOAD_DEBOUNCE, move |res: DebounceEventResult| {
        if res.is_ok_and(|events| !events.is_empty()) {
            let _ = tx.blocking_send(());
        }
    })?;

    // The parent directory survives editors that replace the file on save
    let watch_path = theme_path.parent().unwrap_or(theme_path);
    debouncer
        .watcher()
        .watch(watch_path, RecursiveMode::NonRecursive)?;

    Ok(debouncer)
}

/// Dioxus hook providing the current theme CSS, reloaded whenever the file changes.
#[must_use]
pub fn use_theme_watcher(cancel_token: CancellationToken) -> Signal<String> {
    let mut css_content = use_signal(|| {
        initialize_theme_at(&crt_core::theme_path()).unwrap_or_else(|e| {
            error!("Failed to initialize theme: {}", e);
            DEFAULT_CSS.to_string()
        })
    });

    use_effect(move || {
        let cancel_token = cancel_token.clone();

        spawn(async move {
            let theme_path = crt_core::theme_path();
            let (tx, mut rx) = mpsc::channel::<()>(16);

            let debouncer = match watch_theme_dir(&theme_path, tx) {
                Ok(d) => d,
                Err(e) => {
                    error!("Theme hot reload disabled: {}", e);
                    return;
                }
            };

            info!("Watching theme file for changes: {:?}", theme_path);

            loop {
                tokio::select! {
                    () = cancel_token.cancelled() => {
                        info!("Theme watcher shutting down");
                        break;
                    }
                    Some(()) = rx.recv() => {
                        info!("Theme file changed, reloading CSS");
                        css_content.set(load_theme_css(&theme_path));
                    }
                }
            }

            drop(debouncer);
        });
    });

    css_content
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("crt-theme-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_first_run_writes_default_theme() {
        let dir = temp_dir("first-run");
        let path = dir.join("theme.css");

        let css = initialize_theme_at(&path).unwrap();
        assert_eq!(css, DEFAULT_CSS);
        assert_eq!(fs::read_to_string(&path).unwrap(), DEFAULT_CSS);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_existing_theme_is_kept() {
        let dir = temp_dir("existing");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("theme.css");
        fs::write(&path, "body { color: red; }").unwrap();

        assert_eq!(initialize_theme_at(&path).unwrap(), "body { color: red; }");
        assert_eq!(load_theme_css(&path), "body { color: red; }");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_unreadable_theme_falls_back() {
        let dir = temp_dir("missing");
        assert_eq!(load_theme_css(&dir.join("theme.css")), DEFAULT_CSS);
    }

    #[test]
    fn test_default_theme_styles_every_layer() {
        for selector in [".glitch.visible", ".paused.visible", ".marquee", ".artwork"] {
            assert!(DEFAULT_CSS.contains(selector), "missing {selector}");
        }
    }
}
