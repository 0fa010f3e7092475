//! Keeps the on-screen artwork in step with the display engine.
//!
//! Runs on the background runtime. Every artwork change is resolved through
//! the on-disk cache and published as a `data:` URL on a watch channel that
//! the UI reads from.

use crate::state::ScreenState;
use crt_core::{ArtworkCache, DisplayEngine, DisplayEvent};
use dioxus::prelude::*;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Resolve artwork for every rendered change until cancelled.
pub async fn load_artwork(
    engine: Arc<DisplayEngine>,
    cache: ArtworkCache,
    tx: watch::Sender<Option<String>>,
    cancel_token: CancellationToken,
) {
    let mut rx = engine.subscribe();
    let mut current = engine.state().await.artwork_url;
    publish(&cache, current.as_deref(), &tx).await;

    loop {
        let url = tokio::select! {
            () = cancel_token.cancelled() => break,
            event = rx.recv() => match event {
                Ok(DisplayEvent::Rendered { state, change }) if change.artwork => state.artwork_url,
                Ok(_) => continue,
                Err(RecvError::Lagged(n)) => {
                    info!("Artwork loader missed {} display events", n);
                    engine.state().await.artwork_url
                }
                Err(RecvError::Closed) => break,
            },
        };

        if url != current {
            publish(&cache, url.as_deref(), &tx).await;
            current = url;
        }
    }

    info!("Artwork loader stopped");
}

async fn publish(cache: &ArtworkCache, url: Option<&str>, tx: &watch::Sender<Option<String>>) {
    let artwork = match url {
        Some(url) => match cache.data_url(url).await {
            Ok(data_url) => Some(data_url),
            Err(e) => {
                warn!("Failed to load artwork {}: {}", url, e);
                None
            }
        },
        None => None,
    };
    tx.send_replace(artwork);
}

/// Copy artwork published by [`load_artwork`] into the screen state.
pub fn use_artwork_bridge(rx: watch::Receiver<Option<String>>, screen: ScreenState) {
    use_future(move || {
        let mut rx = rx.clone();
        async move {
            let mut screen = screen;
            loop {
                let artwork = rx.borrow_and_update().clone();
                if *screen.artwork.peek() != artwork {
                    screen.artwork.set(artwork);
                }
                if rx.changed().await.is_err() {
                    break;
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crt_core::{ActiveContent, ContentState, PollOutcome};
    use image::{Rgba, RgbaImage};
    use std::path::PathBuf;
    use std::time::Duration;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("crt-gui-artwork-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn showing(artwork: &str) -> PollOutcome {
        PollOutcome::Content(ActiveContent {
            title: "Alien".into(),
            artwork: Some(artwork.into()),
            state: ContentState::Playing,
            ..Default::default()
        })
    }

    async fn next_value(rx: &mut watch::Receiver<Option<String>>) -> Option<String> {
        tokio::time::timeout(Duration::from_secs(5), rx.changed())
            .await
            .unwrap()
            .unwrap();
        rx.borrow_and_update().clone()
    }

    #[tokio::test]
    async fn test_artwork_follows_display_changes() {
        let dir = temp_dir("follow");
        let cover = dir.join("cover.png");
        RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255]))
            .save(&cover)
            .unwrap();

        let engine = DisplayEngine::new();
        let cache = ArtworkCache::new(dir.join("cache"), 8).unwrap();
        let (tx, mut rx) = watch::channel(None);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(load_artwork(engine.clone(), cache, tx, cancel.clone()));

        // Initial publish for the empty screen
        assert_eq!(next_value(&mut rx).await, None);

        engine.apply_outcome(showing(cover.to_str().unwrap())).await.unwrap();
        let artwork = next_value(&mut rx).await.unwrap();
        assert!(artwork.starts_with("data:image/png;base64,"));

        engine.apply_outcome(showing("null")).await.unwrap();
        assert_eq!(next_value(&mut rx).await, None);

        cancel.cancel();
        handle.await.unwrap();
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_unreachable_artwork_clears_image() {
        let dir = temp_dir("unreachable");
        let engine = DisplayEngine::new();
        let cache = ArtworkCache::new(dir.join("cache"), 8).unwrap();
        let (tx, mut rx) = watch::channel(Some("data:stale".to_string()));
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(load_artwork(engine.clone(), cache, tx, cancel.clone()));
        assert_eq!(next_value(&mut rx).await, None);

        let missing = dir.join("missing.png");
        engine.apply_outcome(showing(missing.to_str().unwrap())).await.unwrap();
        // The failed load publishes None again, which still counts as a change
        assert_eq!(next_value(&mut rx).await, None);

        cancel.cancel();
        handle.await.unwrap();
        let _ = std::fs::remove_dir_all(&dir);
    }
}
