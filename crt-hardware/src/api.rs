//! Local HTTP control API for the fan and CRT power relays.

use crate::error::{HardwareError, Result};
use crate::fan::FanController;
use crate::power::CrtPower;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Shared handles the route handlers operate on
#[derive(Clone)]
pub struct ControlState {
    pub fan: Arc<FanController>,
    pub crt: Arc<CrtPower>,
}

#[derive(Debug, Serialize)]
struct StateResponse {
    state: bool,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// Wraps a hardware failure so handlers can use `?`
struct ApiError(HardwareError);

impl From<HardwareError> for ApiError {
    fn from(e: HardwareError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!("Control request failed: {}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

type ApiResult = std::result::Result<Json<StateResponse>, ApiError>;

/// Run a GPIO operation off the async workers; sysfs access blocks.
async fn gpio<F>(op: F) -> ApiResult
where
    F: FnOnce() -> Result<bool> + Send + 'static,
{
    let state = tokio::task::spawn_blocking(op)
        .await
        .map_err(HardwareError::from)??;
    Ok(Json(StateResponse { state }))
}

async fn fan_state(State(ctl): State<ControlState>) -> ApiResult {
    gpio(move || ctl.fan.is_on()).await
}

async fn fan_set(State(ctl): State<ControlState>, body: String) -> ApiResult {
    gpio(move || ctl.fan.apply(&body)).await
}

async fn crt_state(State(ctl): State<ControlState>) -> ApiResult {
    gpio(move || ctl.crt.is_on()).await
}

async fn crt_on(State(ctl): State<ControlState>) -> ApiResult {
    gpio(move || ctl.crt.switch_on()).await
}

async fn crt_off(State(ctl): State<ControlState>) -> ApiResult {
    gpio(move || ctl.crt.switch_off()).await
}

async fn crt_toggle(State(ctl): State<ControlState>) -> ApiResult {
    gpio(move || ctl.crt.toggle()).await
}

/// Build the control router.
#[must_use]
pub fn router(state: ControlState) -> Router {
    Router::new()
        .route("/crt/fan", get(fan_state).post(fan_set))
        .route("/crt/state", get(crt_state))
        .route("/crt/on", get(crt_on))
        .route("/crt/off", get(crt_off))
        .route("/crt/toggle", get(crt_toggle))
        .with_state(state)
}

/// Serve the control API on `listener` until `cancel_token` fires.
///
/// # Errors
///
/// Returns an error if the server fails.
pub async fn serve(
    listener: TcpListener,
    state: ControlState,
    cancel_token: CancellationToken,
) -> Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("Control API listening on http://{}", addr);
    }

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { cancel_token.cancelled().await })
        .await?;

    info!("Control API stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpio::tests::MemoryPin;
    use serde_json::Value;
    use std::sync::atomic::Ordering;

    struct Harness {
        base: String,
        fan_pin: Arc<MemoryPin>,
        crt_pin: Arc<MemoryPin>,
        cancel: CancellationToken,
        handle: tokio::task::JoinHandle<Result<()>>,
    }

    async fn start() -> Harness {
        let fan_pin = Arc::new(MemoryPin::default());
        let crt_pin = Arc::new(MemoryPin::default());
        let state = ControlState {
            fan: Arc::new(FanController::new(fan_pin.clone())),
            crt: Arc::new(CrtPower::new(crt_pin.clone())),
        };

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(serve(listener, state, cancel.clone()));

        Harness {
            base,
            fan_pin,
            crt_pin,
            cancel,
            handle,
        }
    }

    async fn get_json(url: &str) -> (u16, Value) {
        let resp = reqwest::get(url).await.unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }

    #[tokio::test]
    async fn test_crt_routes_reflect_pin() {
        let h = start().await;

        assert_eq!(
            get_json(&format!("{}/crt/state", h.base)).await,
            (200, serde_json::json!({"state": false}))
        );
        assert_eq!(
            get_json(&format!("{}/crt/on", h.base)).await.1,
            serde_json::json!({"state": true})
        );
        assert!(h.crt_pin.level.load(Ordering::SeqCst));
        assert_eq!(
            get_json(&format!("{}/crt/toggle", h.base)).await.1,
            serde_json::json!({"state": false})
        );
        assert_eq!(
            get_json(&format!("{}/crt/toggle", h.base)).await.1,
            serde_json::json!({"state": true})
        );
        assert_eq!(
            get_json(&format!("{}/crt/off", h.base)).await.1,
            serde_json::json!({"state": false})
        );
        assert!(!h.crt_pin.level.load(Ordering::SeqCst));

        h.cancel.cancel();
        h.handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_fan_post_applies_payload() {
        let h = start().await;
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("{}/crt/fan", h.base))
            .body("on")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200);
        assert_eq!(
            resp.json::<Value>().await.unwrap(),
            serde_json::json!({"state": true})
        );
        assert!(h.fan_pin.level.load(Ordering::SeqCst));
        assert_eq!(
            get_json(&format!("{}/crt/fan", h.base)).await.1,
            serde_json::json!({"state": true})
        );

        let resp = client
            .post(format!("{}/crt/fan", h.base))
            .body("whatever")
            .send()
            .await
            .unwrap();
        assert_eq!(
            resp.json::<Value>().await.unwrap(),
            serde_json::json!({"state": false})
        );
        assert!(!h.fan_pin.level.load(Ordering::SeqCst));

        h.cancel.cancel();
        h.handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_gpio_failure_is_500() {
        let h = start().await;
        h.crt_pin.fail.store(true, Ordering::SeqCst);

        let (status, body) = get_json(&format!("{}/crt/on", h.base)).await;
        assert_eq!(status, 500);
        assert!(body["error"].as_str().unwrap().contains("write failed"));

        h.cancel.cancel();
        h.handle.await.unwrap().unwrap();
    }
}
