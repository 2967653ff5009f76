use aws_config::BehaviorVersion;
use lambda_runtime::{run, service_fn, Error};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tagscope::config::GlueTriggerConfig;
use tagscope::triggers::GlueTrigger;

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let config = GlueTriggerConfig::from_env()?;
    let shared_config = aws_config::defaults(BehaviorVersion::latest()).load().await;
    let trigger = GlueTrigger::new(aws_sdk_glue::Client::new(&shared_config), config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        built = env!("BUILD_TIMESTAMP"),
        "glue-trigger starting"
    );
    run(service_fn(|event| trigger.handle(event))).await
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .json()
        .init();
}
