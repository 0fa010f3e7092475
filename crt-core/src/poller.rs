//! Now-playing polling loop.

use crate::engine::DisplayEngine;
use crate::error::Result;
use crate::source::NowPlayingSource;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Consecutive failures after which each failure is logged at error level
const ESCALATE_AFTER_FAILURES: u32 = 5;

/// Drives a [`NowPlayingSource`] on a fixed interval and feeds the results to a
/// [`DisplayEngine`].
///
/// Polls are serialized: the request is awaited inside the loop, so at most one
/// is ever in flight. Ticks that elapse while a request is outstanding collapse
/// into a single catch-up poll, after which the schedule resumes on the next
/// multiple of the interval.
pub struct NowPlayingPoller {
    source: Arc<dyn NowPlayingSource>,
    engine: Arc<DisplayEngine>,
    poll_interval: Duration,
    cancel_token: CancellationToken,
    consecutive_failures: AtomicU32,
}

impl NowPlayingPoller {
    /// Create a new poller
    ///
    /// # Arguments
    /// * `source` - Where active content records are fetched from
    /// * `engine` - Display engine to update with each result
    /// * `poll_interval` - Time between the starts of consecutive polls
    /// * `cancel_token` - Optional external cancellation token for graceful shutdown
    pub fn new(
        source: Arc<dyn NowPlayingSource>,
        engine: Arc<DisplayEngine>,
        poll_interval: Duration,
        cancel_token: Option<CancellationToken>,
    ) -> Self {
        Self {
            source,
            engine,
            poll_interval,
            cancel_token: cancel_token.unwrap_or_default(),
            consecutive_failures: AtomicU32::new(0),
        }
    }

    /// Failed polls since the last successful one
    #[must_use]
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures.load(Ordering::Relaxed)
    }

    /// Signal the poller to stop after the current poll
    pub fn stop(&self) {
        self.cancel_token.cancel();
    }

    /// Start polling in a background task
    #[must_use]
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            if let Err(e) = self.run().await {
                error!("Now-playing poller stopped with error: {}", e);
            }
        })
    }

    /// Fetch once and hand the result to the engine.
    ///
    /// # Errors
    ///
    /// Returns the transport, decode or endpoint-reported error after it has
    /// been recorded on the engine.
    pub async fn poll_once(&self) -> Result<()> {
        match self.source.fetch().await {
            Ok(outcome) => {
                debug!("Polled {}: {:?}", self.source.name(), outcome);
                self.engine.apply_outcome(outcome).await
            }
            Err(e) => {
                self.engine.record_failure(e.to_string()).await;
                Err(e)
            }
        }
    }

    /// Poll once and track the failure streak, escalating long streaks to error level.
    async fn tick(&self) {
        match self.poll_once().await {
            Ok(()) => {
                let failed = self.consecutive_failures.swap(0, Ordering::Relaxed);
                if failed > 0 {
                    info!("Now-playing endpoint recovered after {} failed polls", failed);
                }
            }
            Err(e) => {
                let failed = self
                    .consecutive_failures
                    .fetch_add(1, Ordering::Relaxed)
                    .saturating_add(1);
                if failed >= ESCALATE_AFTER_FAILURES {
                    error!("{} consecutive failed polls, latest: {}", failed, e);
                }
            }
        }
    }

    /// Run until cancelled.
    ///
    /// # Errors
    ///
    /// Poll failures are recoverable and never end the loop, so this only
    /// returns `Ok` today; the signature leaves room for fatal conditions.
    pub async fn run(&self) -> Result<()> {
        info!(
            "Starting now-playing poller ({}, interval: {:?})",
            self.source.name(),
            self.poll_interval
        );

        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                () = self.cancel_token.cancelled() => {
                    info!("Poller shutting down gracefully");
                    break;
                }
                _ = ticker.tick() => self.tick().await,
            }
        }

        Ok(())
    }
}
