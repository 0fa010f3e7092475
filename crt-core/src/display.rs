use crate::content::{ActiveContent, ContentState};

/// What the CRT is currently showing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayState {
    /// Primary title line
    pub title: String,
    /// Secondary title line (episodic content only)
    pub subtitle: Option<String>,
    /// Artwork image URL
    pub artwork_url: Option<String>,
    /// Whether the glitch animation layer is visible
    pub glitch_visible: bool,
    /// Whether the paused overlay is visible
    pub paused_visible: bool,
}

/// Which parts of the display changed when content was applied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct DisplayChange {
    pub title: bool,
    pub subtitle: bool,
    pub artwork: bool,
    pub layers: bool,
}

impl DisplayChange {
    #[must_use]
    pub const fn any(&self) -> bool {
        self.title || self.subtitle || self.artwork || self.layers
    }
}

impl DisplayState {
    /// Render a poll result onto the display.
    ///
    /// Title and artwork always take the new values; a placeholder artwork
    /// value such as `"null"` clears the image. The subtitle is only
    /// written for episodic content; otherwise whatever was there stays.
    /// `playing` shows the glitch layer and hides the paused overlay, `paused`
    /// does the opposite, and any other state leaves both layers alone.
    pub fn apply(&mut self, content: &ActiveContent) -> DisplayChange {
        let mut change = DisplayChange::default();

        if self.title != content.title {
            self.title.clone_from(&content.title);
            change.title = true;
        }

        let artwork_url = content.artwork_url();
        if self.artwork_url.as_deref() != artwork_url {
            self.artwork_url = artwork_url.map(str::to_string);
            change.artwork = true;
        }

        if let Some(subtitle) = content.subtitle() {
            if self.subtitle.as_deref() != Some(subtitle.as_str()) {
                self.subtitle = Some(subtitle);
                change.subtitle = true;
            }
        }

        let layers = match content.state {
            ContentState::Playing => Some((true, false)),
            ContentState::Paused => Some((false, true)),
            ContentState::Other => None,
        };

        if let Some((glitch, paused)) = layers {
            if (self.glitch_visible, self.paused_visible) != (glitch, paused) {
                self.glitch_visible = glitch;
                self.paused_visible = paused;
                change.layers = true;
            }
        }

        change
    }
}
