use crate::state::ScreenState;
use crt_core::{DisplayEngine, DisplayEvent};
use dioxus::prelude::*;
use std::sync::Arc;
use tracing::{debug, info};

const LOG_TARGET: &str = "crt_gui::bridge";

/// Bridge `DisplayEngine` events to Dioxus signals.
/// Only rendered states reach the screen; empty and failed polls leave it as is.
pub fn use_display_engine_bridge(engine: &Arc<DisplayEngine>, screen: ScreenState) {
    let engine = Arc::clone(engine);
    use_future(move || {
        let engine = engine.clone();
        async move {
            // Catch up with anything rendered before the window existed
            let mut screen = screen;
            screen.apply(&engine.state().await);

            let mut rx = engine.subscribe();

            loop {
                match rx.recv().await {
                    Ok(event) => handle_display_event(event, screen),
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                        info!(target: LOG_TARGET, "Display event channel closed");
                        break;
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        info!(target: LOG_TARGET, "Missed {} display events", n);
                        screen.apply(&engine.state().await);
                    }
                }
            }
        }
    });
}

fn handle_display_event(event: DisplayEvent, mut screen: ScreenState) {
    match event {
        DisplayEvent::Rendered { state, change } => {
            if change.any() {
                debug!(target: LOG_TARGET, "Updating screen: {:?}", change);
                screen.apply(&state);
            }
        }
        DisplayEvent::NothingPlaying | DisplayEvent::PollFailed { .. } => {}
    }
}
