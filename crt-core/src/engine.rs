use crate::content::{ActiveContent, PollOutcome};
use crate::display::{DisplayChange, DisplayState};
use crate::error::{CoreError, Result};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

/// Events emitted by the display engine
#[derive(Debug, Clone)]
pub enum DisplayEvent {
    /// A poll returned content and it was rendered
    Rendered {
        state: DisplayState,
        change: DisplayChange,
    },
    /// The endpoint reported nothing playing; display left as-is
    NothingPlaying,
    /// The poll failed (transport, decode or endpoint-reported error); display left as-is
    PollFailed { message: String },
}

struct DisplayEngineInner {
    state: DisplayState,
    last_error: Option<String>,
}

/// Owns the display state and fans poll results out to the renderer
pub struct DisplayEngine {
    inner: RwLock<DisplayEngineInner>,
    event_tx: broadcast::Sender<DisplayEvent>,
}

impl DisplayEngine {
    /// Create a new display engine
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Subscribe to display events
    pub fn subscribe(&self) -> broadcast::Receiver<DisplayEvent> {
        self.event_tx.subscribe()
    }

    /// Apply one poll outcome.
    ///
    /// # Errors
    ///
    /// An endpoint-reported error is recorded like any other failed poll and
    /// then returned as [`CoreError::EndpointReported`], so callers count it
    /// alongside transport and decode failures.
    pub async fn apply_outcome(&self, outcome: PollOutcome) -> Result<()> {
        match outcome {
            PollOutcome::Content(content) => self.render(content).await,
            PollOutcome::Empty => {
                debug!("Nothing playing, display unchanged");
                let _ = self.event_tx.send(DisplayEvent::NothingPlaying);
            }
            PollOutcome::EndpointError(message) => {
                let e = CoreError::EndpointReported { message };
                self.record_failure(e.to_string()).await;
                return Err(e);
            }
        }
        Ok(())
    }

    /// Record a failed poll without touching the display
    pub async fn record_failure(&self, message: String) {
        warn!("Now-playing poll failed: {}", message);
        self.inner.write().await.last_error = Some(message.clone());
        let _ = self.event_tx.send(DisplayEvent::PollFailed { message });
    }

    async fn render(&self, content: ActiveContent) {
        let mut inner = self.inner.write().await;
        let change = inner.state.apply(&content);

        if change.layers {
            info!(
                "Playback state now {} (glitch: {}, paused: {})",
                content.state, inner.state.glitch_visible, inner.state.paused_visible
            );
        }
        if change.title || change.subtitle {
            info!(
                "Now showing: {} {}",
                inner.state.title,
                inner.state.subtitle.as_deref().unwrap_or_default()
            );
        }

        inner.last_error = None;

        let _ = self.event_tx.send(DisplayEvent::Rendered {
            state: inner.state.clone(),
            change,
        });
    }

    /// Get the current display state
    pub async fn state(&self) -> DisplayState {
        self.inner.read().await.state.clone()
    }

    /// Get the most recent poll diagnostic, cleared by the next rendered poll
    pub async fn last_error(&self) -> Option<String> {
        self.inner.read().await.last_error.clone()
    }
}

impl Default for DisplayEngine {
    fn default() -> Self {
        let (event_tx, _) = broadcast::channel(64);
        Self {
            inner: RwLock::new(DisplayEngineInner {
                state: DisplayState::default(),
                last_error: None,
            }),
            event_tx,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentState;

    fn playing(title: &str) -> PollOutcome {
        PollOutcome::Content(ActiveContent {
            title: title.into(),
            state: ContentState::Playing,
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_content_renders_and_emits() {
        let engine = DisplayEngine::new();
        let mut rx = engine.subscribe();

        engine.apply_outcome(playing("Alien")).await.unwrap();

        let state = engine.state().await;
        assert_eq!(state.title, "Alien");
        assert!(state.glitch_visible);

        match rx.recv().await.unwrap() {
            DisplayEvent::Rendered { state, change } => {
                assert_eq!(state.title, "Alien");
                assert!(change.title);
                assert!(change.layers);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_outcome_does_not_mutate() {
        let engine = DisplayEngine::new();
        engine.apply_outcome(playing("Alien")).await.unwrap();
        let before = engine.state().await;
        let mut rx = engine.subscribe();

        engine.apply_outcome(PollOutcome::Empty).await.unwrap();

        assert_eq!(engine.state().await, before);
        assert!(matches!(rx.recv().await.unwrap(), DisplayEvent::NothingPlaying));
        assert_eq!(engine.last_error().await, None);
    }

    #[tokio::test]
    async fn test_endpoint_error_records_diagnostic_without_mutation() {
        let engine = DisplayEngine::new();
        engine.apply_outcome(playing("Alien")).await.unwrap();
        let before = engine.state().await;
        let mut rx = engine.subscribe();

        let result = engine
            .apply_outcome(PollOutcome::EndpointError("player offline".into()))
            .await;
        assert!(matches!(
            result,
            Err(CoreError::EndpointReported { ref message }) if message == "player offline"
        ));

        assert_eq!(engine.state().await, before);
        let diagnostic = engine.last_error().await.unwrap();
        assert!(diagnostic.contains("player offline"));
        match rx.recv().await.unwrap() {
            DisplayEvent::PollFailed { message } => assert!(message.contains("player offline")),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_successful_render_clears_diagnostic() {
        let engine = DisplayEngine::new();
        engine.record_failure("connection refused".into()).await;
        assert!(engine.last_error().await.is_some());

        engine.apply_outcome(playing("Alien")).await.unwrap();
        assert_eq!(engine.last_error().await, None);
        assert_eq!(engine.state().await.title, "Alien");
    }
}
