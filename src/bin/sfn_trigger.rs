use aws_config::BehaviorVersion;
use lambda_runtime::{run, service_fn, Error};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tagscope::config::SfnTriggerConfig;
use tagscope::triggers::StateMachineTrigger;

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let config = SfnTriggerConfig::from_env()?;
    let shared_config = aws_config::defaults(BehaviorVersion::latest()).load().await;
    let trigger = StateMachineTrigger::new(aws_sdk_sfn::Client::new(&shared_config), config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        built = env!("BUILD_TIMESTAMP"),
        "sfn-trigger starting"
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
