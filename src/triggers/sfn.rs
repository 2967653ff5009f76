use aws_lambda_events::event::s3::S3Event;
use aws_sdk_sfn::error::DisplayErrorContext;
use chrono::Utc;
use lambda_runtime::{Error, LambdaEvent};
use tracing::{error, info};

use super::derive_output_path;
use crate::config::SfnTriggerConfig;
use crate::errors::TagscopeError;
use crate::handler::{first_record, object_stem, HandlerResponse};

/// Starts a Step Functions ETL execution for each uploaded file.
pub struct StateMachineTrigger {
    sfn: aws_sdk_sfn::Client,
    config: SfnTriggerConfig,
}

impl StateMachineTrigger {
    pub fn new(sfn: aws_sdk_sfn::Client, config: SfnTriggerConfig) -> Self {
        Self { sfn, config }
    }

    pub async fn handle(&self, event: LambdaEvent<S3Event>) -> Result<HandlerResponse, Error> {
        match self.start_execution(&event.payload).await {
            Ok(execution_arn) => Ok(HandlerResponse::ok(serde_json::json!({
                "message": "Step Functions state machine triggered successfully",
                "executionArn": execution_arn,
            }))),
            Err(e) => {
                error!(error = %e, "Step Functions trigger failed");
                Ok(HandlerResponse::failure(format!(
                    "Error triggering state machine: {}",
                    e
                )))
            }
        }
    }

    async fn start_execution(&self, event: &S3Event) -> Result<String, TagscopeError> {
        let (bucket, key) = first_record(event)?;
        let timestamp = Utc::now();
        let input_path = format!("s3://{}/{}", bucket, key);
        let output_path = derive_output_path(&self.config.output_bucket, &key, timestamp);
        let execution_name = format!(
            "ETL-{}-{}",
            object_stem(&key),
            timestamp.format("%Y%m%d%H%M%S")
        );

        let input = serde_json::json!({
            "input_path": input_path,
            "output_path": output_path,
        });
        info!(
            state_machine_arn = %self.config.state_machine_arn,
            execution_name = %execution_name,
            input_path = %input_path,
            "Starting Step Functions execution"
        );

        let response = self
            .sfn
            .start_execution()
            .state_machine_arn(&self.config.state_machine_arn)
            .name(&execution_name)
            .input(input.to_string())
            .send()
            .await
            .map_err(|e| {
                TagscopeError::Trigger(format!(
                    "StartExecution failed: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        let execution_arn = response.execution_arn().to_string();
        info!(execution_arn = %execution_arn, "Step Functions execution started");
        Ok(execution_arn)
    }
}
