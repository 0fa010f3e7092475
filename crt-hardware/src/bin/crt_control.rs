use crt_hardware::{service, ControlState, CrtPower, FanController, SysfsPin};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::error;

const SERVICE_NAME: &str = "crt-control";

#[tokio::main]
async fn main() {
    let config = service::init(SERVICE_NAME);
    let cancel_token = service::shutdown_token();

    let fan_pin = match SysfsPin::new(config.fan.gpio_pin) {
        Ok(pin) => Arc::new(pin),
        Err(e) => {
            error!("Failed to set up fan pin: {}", e);
            std::process::exit(1);
        }
    };
    let crt_pin = match SysfsPin::new(config.crt.gpio_pin) {
        Ok(pin) => Arc::new(pin),
        Err(e) => {
            error!("Failed to set up CRT power pin: {}", e);
            std::process::exit(1);
        }
    };

    let state = ControlState {
        fan: Arc::new(FanController::new(fan_pin)),
        crt: Arc::new(CrtPower::new(crt_pin)),
    };

    let listener = match TcpListener::bind(&config.control.listen_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", config.control.listen_addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = crt_hardware::serve(listener, state, cancel_token).await {
        error!("Control API failed: {}", e);
        std::process::exit(1);
    }
}
