use crate::state::ScreenState;
use dioxus::prelude::*;

/// Animated interference shown while content is playing
#[component]
pub fn GlitchLayer() -> Element {
    let screen = use_context::<ScreenState>();
    let visible = *screen.glitch_visible.read();

    rsx! {
        div {
            class: if visible { "glitch visible" } else { "glitch" },
            div { class: "scanlines" }
            div { class: "noise" }
        }
    }
}

/// Pause symbol shown while content is paused
#[component]
pub fn PausedOverlay() -> Element {
    let screen = use_context::<ScreenState>();
    let visible = *screen.paused_visible.read();

    rsx! {
        div {
            class: if visible { "paused visible" } else { "paused" },
            div { class: "pause-bar" }
            div { class: "pause-bar" }
        }
    }
}
