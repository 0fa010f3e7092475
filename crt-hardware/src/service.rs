//! Startup plumbing shared by the headless service binaries.

use crt_core::{logging, Config, CoreError};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Initialise tracing and load the config, exiting the process if the service
/// cannot start.
///
/// A missing config is written out as a template and the process exits cleanly
/// so the user can edit it.
#[must_use]
pub fn init(service: &str) -> Config {
    let file_logging_enabled = logging::check_file_logging_enabled(&Config::config_path());
    logging::init_tracing(service, file_logging_enabled);

    match Config::load_or_create() {
        Ok(config) => config,
        Err(CoreError::ConfigNotFound { path }) => {
            info!(
                "Created config template at {}; edit it and restart {}",
                path.display(),
                service
            );
            std::process::exit(0);
        }
        Err(e) => {
            error!("Failed to load config: {e}");
            std::process::exit(1);
        }
    }
}

/// Cancellation token that fires on Ctrl+C / SIGTERM.
#[must_use]
pub fn shutdown_token() -> CancellationToken {
    let cancel_token = CancellationToken::new();

    let ctrlc_token = cancel_token.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received shutdown signal, shutting down gracefully...");
        ctrlc_token.cancel();
    }) {
        error!("Failed to set Ctrl+C handler: {}", e);
    }

    cancel_token
}
