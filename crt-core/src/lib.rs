pub mod artwork;
pub mod config;
pub mod content;
pub mod display;
pub mod engine;
pub mod error;
pub mod logging;
pub mod paths;
pub mod poller;
pub mod source;

pub use artwork::ArtworkCache;
pub use config::{
    CONFIG_TEMPLATE, ConditionsConfig, Config, ControlConfig, CrtPowerConfig, DisplayConfig,
    FanConfig, LoggingConfig, NowPlayingConfig,
};

pub use content::{ActiveContent, ContentState, EpisodeNumber, PollOutcome};
pub use display::{DisplayChange, DisplayState};
pub use engine::{DisplayEngine, DisplayEvent};
pub use error::CoreError;
pub use paths::{
    artwork_cache_dir, config_dir, config_path, log_file_path, theme_path, ARTWORK_DIR_NAME,
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, THEME_FILE_NAME,
};
pub use poller::NowPlayingPoller;
pub use source::{HttpNowPlayingSource, NowPlayingSource};
