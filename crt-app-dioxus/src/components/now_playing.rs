use crate::state::{layout_line, ScreenState};
use dioxus::prelude::*;

/// Artwork with the title and subtitle lines underneath.
#[component]
pub fn NowPlaying(
    /// Lines longer than this many characters scroll
    char_limit: usize,
) -> Element {
    let screen = use_context::<ScreenState>();

    let title = screen.title.read().clone();
    let subtitle = screen.subtitle.read().clone().unwrap_or_default();
    let artwork = screen.artwork.read().clone();

    rsx! {
        div {
            class: "now-playing",

            div {
                class: "artwork",
                if let Some(src) = artwork {
                    img { src: "{src}", alt: "" }
                }
            }

            TextLine { class: "title", text: title, char_limit }
            TextLine { class: "subtitle", text: subtitle, char_limit }
        }
    }
}

#[component]
fn TextLine(class: &'static str, text: String, char_limit: usize) -> Element {
    let line = layout_line(&text, char_limit);

    rsx! {
        div {
            class: "line {class}",
            span {
                // Keyed on the text so the scroll restarts from the beginning on change
                key: "{line.text}",
                class: if line.scrolling { "marquee" } else { "static" },
                "{line.text}"
            }
        }
    }
}
