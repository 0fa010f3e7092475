mod now_playing;
mod overlays;

pub use now_playing::NowPlaying;
pub use overlays::{GlitchLayer, PausedOverlay};
