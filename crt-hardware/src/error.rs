use crt_core::CoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the GPIO, fan, power and conditions services.
#[derive(Debug, Error)]
pub enum HardwareError {
    /// A sysfs GPIO file could not be read or written.
    #[error("GPIO {pin} failed: {source}")]
    Gpio {
        pin: u32,
        #[source]
        source: std::io::Error,
    },

    /// A GPIO value file held something other than `0` or `1`.
    #[error("GPIO {pin} returned unexpected value {value:?}")]
    InvalidPinValue { pin: u32, value: String },

    /// The conditions sensor could not produce a reading.
    #[error("Sensor read from {path} failed: {reason}")]
    Sensor { path: PathBuf, reason: String },

    /// The publish endpoint answered with a non-success status.
    #[error("Publish endpoint returned status {status}")]
    PublishStatus { status: u16 },

    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Network request failed: {0}")]
    Middleware(#[from] reqwest_middleware::Error),

    #[error("Blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Convenience type alias for Results with `HardwareError`.
pub type Result<T> = std::result::Result<T, HardwareError>;
