use crt_hardware::{service, ConditionsReporter};
use tracing::error;

const SERVICE_NAME: &str = "crt-conditions-reporter";

#[tokio::main]
async fn main() {
    let config = service::init(SERVICE_NAME);
    let cancel_token = service::shutdown_token();

    let reporter = match ConditionsReporter::from_config(&config.conditions, Some(cancel_token)) {
        Ok(reporter) => reporter,
        Err(e) => {
            error!("Failed to start conditions reporter: {}", e);
            std::process::exit(1);
        }
    };

    reporter.run().await;
}
