use aws_config::BehaviorVersion;
use lambda_runtime::{run, service_fn, Error};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tagscope::athena::QueryExecutor;
use tagscope::config::ReporterConfig;
use tagscope::email::ReportDispatcher;
use tagscope::pipeline::ReportPipeline;

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let config = ReporterConfig::from_env()?;
    let shared_config = aws_config::defaults(BehaviorVersion::latest()).load().await;

    let executor = QueryExecutor::new(
        aws_sdk_athena::Client::new(&shared_config),
        aws_sdk_s3::Client::new(&shared_config),
        config.database.clone(),
        config.workgroup.clone(),
        config.output_bucket.clone(),
    );
    let dispatcher = ReportDispatcher::new(
        aws_sdk_sesv2::Client::new(&shared_config),
        config.sender_email.clone(),
        config.recipients.clone(),
    );
    let pipeline = ReportPipeline::new(executor, dispatcher, config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        built = env!("BUILD_TIMESTAMP"),
        "tagging-reporter starting"
    );
    run(service_fn(|event| pipeline.handle(event))).await
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .json()
        .init();
}
