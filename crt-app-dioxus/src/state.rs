use crt_core::DisplayState;
use dioxus::prelude::*;

/// Padding placed either side of scrolling text
const MARQUEE_PADDING: &str = "  ";
/// Number of copies of the padded text in a scrolling line
const MARQUEE_COPIES: usize = 3;

/// Text to render for a line, and whether it scrolls.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineText {
    pub text: String,
    pub scrolling: bool,
}

/// Lay out a line for the screen.
///
/// HTML entities are decoded first, so `&amp;` counts as one character.
/// Lines longer than `char_limit` characters become a marquee: the padded text
/// is repeated so that scrolling by one copy's width wraps around seamlessly.
#[must_use]
pub fn layout_line(text: &str, char_limit: usize) -> LineText {
    let text = html_escape::decode_html_entities(text);
    if text.chars().count() <= char_limit {
        return LineText {
            text: text.into_owned(),
            scrolling: false,
        };
    }

    LineText {
        text: format!("{MARQUEE_PADDING}{text}{MARQUEE_PADDING}").repeat(MARQUEE_COPIES),
        scrolling: true,
    }
}

/// Screen contents as granular signals so each element re-renders on its own.
#[derive(Clone, Copy)]
pub struct ScreenState {
    pub title: Signal<String>,
    pub subtitle: Signal<Option<String>>,
    /// Cached artwork as a `data:` URL, fed by the artwork loader
    pub artwork: Signal<Option<String>>,
    pub glitch_visible: Signal<bool>,
    pub paused_visible: Signal<bool>,
}

impl ScreenState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            title: Signal::new(String::new()),
            subtitle: Signal::new(None),
            artwork: Signal::new(None),
            glitch_visible: Signal::new(false),
            paused_visible: Signal::new(false),
        }
    }

    /// Copy a rendered display state into the signals, only writing the ones
    /// whose value differs. Artwork arrives separately once it is cached.
    pub fn apply(&mut self, state: &DisplayState) {
        if *self.title.peek() != state.title {
            self.title.set(state.title.clone());
        }
        if *self.subtitle.peek() != state.subtitle {
            self.subtitle.set(state.subtitle.clone());
        }
        if *self.glitch_visible.peek() != state.glitch_visible {
            self.glitch_visible.set(state.glitch_visible);
        }
        if *self.paused_visible.peek() != state.paused_visible {
            self.paused_visible.set(state.paused_visible);
        }
    }
}

impl Default for ScreenState {
    fn default() -> Self {
        Self::new()
    }
}
