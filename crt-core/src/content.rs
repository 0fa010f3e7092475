//! The active content record returned by the now-playing endpoint.

use crate::error::Result;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Playback state reported alongside the active content.
///
/// Only `playing` and `paused` drive the visual layers; any other value
/// (including a missing one) deserializes to [`ContentState::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentState {
    Playing,
    Paused,
    #[default]
    #[serde(other)]
    Other,
}

impl ContentState {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ContentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Season or episode number as shown on screen.
///
/// The endpoint is loose about the type: integers, floats, negatives and
/// strings all turn up. Any JSON scalar is accepted and kept in its display
/// form, so `1`, `1.0` and `"1"` all render as `1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EpisodeNumber(pub String);

impl<'de> Deserialize<'de> for EpisodeNumber {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(Self(s)),
            // f64's Display drops a zero fraction, serde_json's keeps it
            Value::Number(n) => Ok(Self(match n.as_f64() {
                Some(f) if n.is_f64() => f.to_string(),
                _ => n.to_string(),
            })),
            Value::Bool(b) => Ok(Self(b.to_string())),
            other => Err(serde::de::Error::custom(format!(
                "expected a number or string, got {other}"
            ))),
        }
    }
}

impl fmt::Display for EpisodeNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Artwork values the endpoint uses to mean "no image"
const ARTWORK_PLACEHOLDERS: [&str; 4] = ["", "None", "none", "null"];

/// What is currently playing, as returned by a single poll
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActiveContent {
    #[serde(default)]
    pub title: String,
    /// Present only for episodic content
    #[serde(default)]
    pub show: Option<String>,
    #[serde(default)]
    pub season: Option<EpisodeNumber>,
    #[serde(default)]
    pub episode: Option<EpisodeNumber>,
    #[serde(default)]
    pub artwork: Option<String>,
    #[serde(default, deserialize_with = "deserialize_state")]
    pub state: ContentState,
}

/// `"state": null` is treated like a missing state
fn deserialize_state<'de, D>(deserializer: D) -> std::result::Result<ContentState, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<ContentState>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl ActiveContent {
    /// Secondary title line, `"{show} - S{season}E{episode}"`, for episodic content only
    #[must_use]
    pub fn subtitle(&self) -> Option<String> {
        let show = self.show.as_ref()?;
        let season = self.season.as_ref().map(ToString::to_string).unwrap_or_default();
        let episode = self.episode.as_ref().map(ToString::to_string).unwrap_or_default();
        Some(format!("{show} - S{season}E{episode}"))
    }

    /// Artwork URL, or `None` when the field is missing or a placeholder
    #[must_use]
    pub fn artwork_url(&self) -> Option<&str> {
        self.artwork
            .as_deref()
            .map(str::trim)
            .filter(|url| !ARTWORK_PLACEHOLDERS.contains(url))
    }
}

/// Classification of one now-playing response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Something is playing (or at least reported)
    Content(ActiveContent),
    /// Empty body, `null` or `{}`: nothing playing
    Empty,
    /// The endpoint answered with an `error` key
    EndpointError(String),
}

impl PollOutcome {
    /// Classify a raw response body.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidResponse`](crate::CoreError::InvalidResponse) if the
    /// body is not JSON or its fields have unexpected types.
    pub fn from_body(body: &str) -> Result<Self> {
        if body.trim().is_empty() {
            return Ok(Self::Empty);
        }

        let value: Value = serde_json::from_str(body)?;
        Self::from_value(value)
    }

    /// Classify an already-decoded JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if an object without an `error` key does not match
    /// [`ActiveContent`]. An `error` key is reported whatever its value,
    /// including `null`.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Self::Empty),
            Value::Object(ref map) if map.is_empty() => Ok(Self::Empty),
            Value::Object(ref map) if map.contains_key("error") => {
                let message = match &map["error"] {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                Ok(Self::EndpointError(message))
            }
            other => Ok(Self::Content(serde_json::from_value(other)?)),
        }
    }
}
