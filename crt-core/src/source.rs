//! Where now-playing records come from.

use crate::config::NowPlayingConfig;
use crate::content::PollOutcome;
use crate::error::{CoreError, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// A source of active content records.
///
/// The poller calls [`NowPlayingSource::fetch`] once per tick and never
/// issues a second call before the first has returned.
#[async_trait]
pub trait NowPlayingSource: Send + Sync {
    /// Returns a human-readable name for this source.
    fn name(&self) -> &'static str;

    /// Fetch and classify the current record.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-success status, or a body
    /// that cannot be decoded. An `error` key in the body is not an `Err`; it is
    /// reported as [`PollOutcome::EndpointError`].
    async fn fetch(&self) -> Result<PollOutcome>;
}

/// Polls a local HTTP endpoint with a plain GET
pub struct HttpNowPlayingSource {
    client: reqwest::Client,
    url: String,
}

impl HttpNowPlayingSource {
    /// Create a source for `url` with the given request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(concat!("smart-mini-crt/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Create a source from the `[now_playing]` config section.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn from_config(config: &NowPlayingConfig) -> Result<Self> {
        Self::new(&config.url, config.request_timeout())
    }
}

#[async_trait]
impl NowPlayingSource for HttpNowPlayingSource {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch(&self) -> Result<PollOutcome> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(CoreError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        debug!("GET {} -> {} ({} bytes)", self.url, status, body.len());

        PollOutcome::from_body(&body)
    }
}
