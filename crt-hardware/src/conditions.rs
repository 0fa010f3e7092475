//! Temperature and humidity reporting from a DHT22 sensor.

use crate::error::{HardwareError, Result};
use crt_core::ConditionsConfig;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

/// Timeout for a single publish request
const PUBLISH_TIMEOUT_SECS: u64 = 10;

/// Raw sensor values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConditionsReading {
    pub temperature_c: f64,
    pub humidity_pct: f64,
}

/// JSON body sent to the publish endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ConditionsPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
}

impl ConditionsPayload {
    /// Keep only positive values, rounded to two decimal places.
    ///
    /// The sensor reports zero or negative values when a read goes wrong, so
    /// those are dropped rather than published.
    #[must_use]
    pub fn from_reading(reading: &ConditionsReading) -> Self {
        Self {
            temperature: positive_rounded(reading.temperature_c),
            humidity: positive_rounded(reading.humidity_pct),
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.temperature.is_none() && self.humidity.is_none()
    }
}

fn positive_rounded(value: f64) -> Option<f64> {
    (value > 0.0).then(|| (value * 100.0).round() / 100.0)
}

/// Source of conditions readings. Reads are blocking.
pub trait ConditionsSensor: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the sensor could not be read.
    fn read(&self) -> Result<ConditionsReading>;
}

/// DHT22 exposed through the kernel's IIO driver
#[derive(Debug, Clone)]
pub struct IioDht22Sensor {
    device_dir: PathBuf,
}

impl IioDht22Sensor {
    #[must_use]
    pub fn new(device_dir: impl Into<PathBuf>) -> Self {
        Self {
            device_dir: device_dir.into(),
        }
    }

    /// Read a channel holding a value in thousandths.
    fn read_milli(&self, channel: &str) -> Result<f64> {
        let path = self.device_dir.join(channel);
        let raw = std::fs::read_to_string(&path).map_err(|e| sensor_error(&path, &e))?;
        let milli: i64 = raw.trim().parse().map_err(|e| sensor_error(&path, &e))?;

        #[allow(clippy::cast_precision_loss)]
        Ok(milli as f64 / 1000.0)
    }
}

fn sensor_error(path: &Path, reason: &dyn std::fmt::Display) -> HardwareError {
    HardwareError::Sensor {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

impl ConditionsSensor for IioDht22Sensor {
    fn read(&self) -> Result<ConditionsReading> {
        Ok(ConditionsReading {
            temperature_c: self.read_milli("in_temp_input")?,
            humidity_pct: self.read_milli("in_humidityrelative_input")?,
        })
    }
}

/// Build the HTTP client used for publishing, retrying transient failures with
/// exponential backoff.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be created.
pub fn publish_client(max_retries: u32) -> Result<ClientWithMiddleware> {
    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);
    retrying_client(retry_policy)
}

fn retrying_client(retry_policy: ExponentialBackoff) -> Result<ClientWithMiddleware> {
    let base_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(PUBLISH_TIMEOUT_SECS))
        .user_agent(concat!("smart-mini-crt/", env!("CARGO_PKG_VERSION")))
        .build()?;

    Ok(ClientBuilder::new(base_client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build())
}

/// Periodically reads a sensor and POSTs the payload to an HTTP endpoint.
pub struct ConditionsReporter {
    sensor: Arc<dyn ConditionsSensor>,
    client: ClientWithMiddleware,
    publish_url: Url,
    interval: Duration,
    cancel_token: CancellationToken,
}

impl ConditionsReporter {
    #[must_use]
    pub fn new(
        sensor: Arc<dyn ConditionsSensor>,
        client: ClientWithMiddleware,
        publish_url: Url,
        interval: Duration,
        cancel_token: Option<CancellationToken>,
    ) -> Self {
        Self {
            sensor,
            client,
            publish_url,
            interval,
            cancel_token: cancel_token.unwrap_or_default(),
        }
    }

    /// Build a reporter reading the configured IIO device.
    ///
    /// # Errors
    ///
    /// Returns an error if the publish URL is missing or invalid, or if the
    /// HTTP client cannot be created.
    pub fn from_config(
        config: &ConditionsConfig,
        cancel_token: Option<CancellationToken>,
    ) -> Result<Self> {
        let publish_url = config.publish_url()?;
        let client = publish_client(config.max_retries)?;
        let sensor = Arc::new(IioDht22Sensor::new(&config.sensor_device));

        Ok(Self::new(
            sensor,
            client,
            publish_url,
            Duration::from_secs(config.interval_secs),
            cancel_token,
        ))
    }

    /// Take one reading. A failed read yields an empty payload.
    async fn sample(&self) -> Result<ConditionsPayload> {
        let sensor = Arc::clone(&self.sensor);
        let reading = tokio::task::spawn_blocking(move || sensor.read()).await?;

        match reading {
            Ok(reading) => {
                debug!("Sensor reading: {:?}", reading);
                Ok(ConditionsPayload::from_reading(&reading))
            }
            Err(e) => {
                warn!("Sensor read failed: {}", e);
                Ok(ConditionsPayload::default())
            }
        }
    }

    /// Read the sensor and publish the payload once.
    ///
    /// # Errors
    ///
    /// Returns an error if publishing fails after retries.
    pub async fn report_once(&self) -> Result<ConditionsPayload> {
        let payload = self.sample().await?;

        let response = self
            .client
            .post(self.publish_url.clone())
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(HardwareError::PublishStatus {
                status: status.as_u16(),
            });
        }

        debug!("Published conditions: {:?}", payload);
        Ok(payload)
    }

    /// Report on every interval until cancelled. Failures are logged and the
    /// loop carries on.
    pub async fn run(&self) {
        info!(
            "Starting conditions reporter (url: {}, interval: {:?})",
            self.publish_url, self.interval
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                () = self.cancel_token.cancelled() => {
                    info!("Conditions reporter shutting down gracefully");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.report_once().await {
                        warn!("Failed to publish conditions: {}", e);
                    }
                }
            }
        }
    }

    /// Signal the reporter to stop
    pub fn stop(&self) {
        self.cancel_token.cancel();
    }
}
