use crate::components::{GlitchLayer, NowPlaying, PausedOverlay};
use crate::theme_watcher::use_theme_watcher;
use crt_core::DisplayConfig;
use dioxus::prelude::*;
use tokio_util::sync::CancellationToken;

/// Root application component.
/// Stacks the now-playing content under the glitch and paused layers.
#[component]
pub fn App() -> Element {
    let display: DisplayConfig = use_context();
    let cancel_token: CancellationToken = use_context();
    let css = use_theme_watcher(cancel_token);

    rsx! {
        style { "{css}" }
        div {
            class: "screen",
            NowPlaying { char_limit: display.char_limit }
            GlitchLayer {}
            PausedOverlay {}
        }
    }
}
