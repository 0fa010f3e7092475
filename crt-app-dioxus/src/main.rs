mod app;
mod artwork;
mod bridge;
mod components;
mod state;
mod theme_watcher;

use crate::app::App;
use crate::artwork::{load_artwork, use_artwork_bridge};
use crate::bridge::use_display_engine_bridge;
use crate::state::ScreenState;
use crt_core::{
    logging, ArtworkCache, Config, CoreError, DisplayConfig, DisplayEngine, DisplayEvent,
    HttpNowPlayingSource, NowPlayingPoller,
};
use dioxus::desktop::tao::window::Fullscreen;
use dioxus::desktop::{LogicalSize, WindowBuilder};
use dioxus::prelude::*;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

const APP_NAME: &str = "Smart Mini CRT";
const SERVICE_NAME: &str = "crt-gui";

fn main() {
    // Logging comes up before the full config load so config errors are logged
    let file_logging_enabled = logging::check_file_logging_enabled(&Config::config_path());
    logging::init_tracing(SERVICE_NAME, file_logging_enabled);

    let config = match Config::load_or_create() {
        Ok(config) => config,
        Err(CoreError::ConfigNotFound { path }) => {
            info!(
                "Created config template at {}; set now_playing.url and restart",
                path.display()
            );
            std::process::exit(0);
        }
        Err(e) => {
            error!("Failed to load config: {e}");
            std::process::exit(1);
        }
    };

    let source = match HttpNowPlayingSource::from_config(&config.now_playing) {
        Ok(source) => Arc::new(source),
        Err(e) => {
            error!("Failed to create now-playing client: {e}");
            std::process::exit(1);
        }
    };

    let artwork_cache = match ArtworkCache::from_config(&config.display) {
        Ok(cache) => cache,
        Err(e) => {
            error!("Failed to create artwork cache: {e}");
            std::process::exit(1);
        }
    };

    // Create tokio runtime for background tasks
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {e}");
            std::process::exit(1);
        }
    };

    let engine = DisplayEngine::new();

    // Create shared cancellation token for graceful shutdown
    let cancel_token = CancellationToken::new();

    let ctrlc_token = cancel_token.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received Ctrl+C, shutting down gracefully...");
        ctrlc_token.cancel();
    }) {
        error!("Failed to set Ctrl+C handler: {}", e);
    }

    let poller = Arc::new(NowPlayingPoller::new(
        source,
        engine.clone(),
        config.now_playing.poll_interval(),
        Some(cancel_token.clone()),
    ));

    // `start` spawns onto the current runtime, so call it from inside one
    runtime.spawn(async move { supervise("Now-playing poller", poller.start()).await });
    runtime.spawn(log_display_events(engine.clone()));

    let (artwork_tx, artwork_rx) = watch::channel(None);
    runtime.spawn(load_artwork(
        engine.clone(),
        artwork_cache,
        artwork_tx,
        cancel_token.clone(),
    ));

    let window = build_window(&config.display);

    let dioxus_config = dioxus::desktop::Config::default()
        .with_window(window)
        .with_disable_context_menu(true);

    dioxus::LaunchBuilder::desktop()
        .with_cfg(dioxus_config)
        .with_context(engine)
        .with_context(artwork_rx)
        .with_context(config.display)
        .with_context(cancel_token)
        .launch(app);
}

fn build_window(display: &DisplayConfig) -> WindowBuilder {
    let window = WindowBuilder::new()
        .with_title(APP_NAME)
        .with_decorations(false)
        .with_resizable(false)
        .with_inner_size(LogicalSize::new(
            f64::from(display.width),
            f64::from(display.height),
        ));

    if display.fullscreen {
        window.with_fullscreen(Some(Fullscreen::Borderless(None)))
    } else {
        window
    }
}

/// Root component that sets up context and renders the app
fn app() -> Element {
    let screen = use_context_provider(ScreenState::new);
    let engine: Arc<DisplayEngine> = use_context();
    let artwork_rx: watch::Receiver<Option<String>> = use_context();

    use_display_engine_bridge(&engine, screen);
    use_artwork_bridge(artwork_rx, screen);

    rsx! {
        document::Title { "{APP_NAME}" },
        App {}
    }
}

/// Wait for a background task, logging it if it panicked or was aborted.
async fn supervise(name: &'static str, handle: JoinHandle<()>) -> Result<(), JoinError> {
    handle.await.map_err(|e| {
        error!("{name} task failed: {e}");
        e
    })
}

/// Log display events to the console
async fn log_display_events(engine: Arc<DisplayEngine>) {
    let mut rx = engine.subscribe();

    loop {
        match rx.recv().await {
            Ok(DisplayEvent::Rendered { state, change }) => {
                if change.artwork {
                    info!("Artwork: {}", state.artwork_url.as_deref().unwrap_or("none"));
                }
            }
            Ok(DisplayEvent::NothingPlaying) => {}
            Ok(DisplayEvent::PollFailed { message }) => {
                info!("Display left unchanged after failed poll: {}", message);
            }
            Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                info!("Display event channel closed");
                break;
            }
            Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                info!("Missed {} display events", n);
            }
        }
    }
}
