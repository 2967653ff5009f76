use aws_lambda_events::event::s3::S3Event;
use aws_sdk_glue::error::DisplayErrorContext;
use chrono::Utc;
use lambda_runtime::{Error, LambdaEvent};
use tracing::{error, info};

use super::derive_output_path;
use crate::config::GlueTriggerConfig;
use crate::errors::TagscopeError;
use crate::handler::{first_record, HandlerResponse};

/// Starts a Glue job run for each uploaded file.
pub struct GlueTrigger {
    glue: aws_sdk_glue::Client,
    config: GlueTriggerConfig,
}

impl GlueTrigger {
    pub fn new(glue: aws_sdk_glue::Client, config: GlueTriggerConfig) -> Self {
        Self { glue, config }
    }

    pub async fn handle(&self, event: LambdaEvent<S3Event>) -> Result<HandlerResponse, Error> {
        match self.start_job(&event.payload).await {
            Ok(job_run_id) => Ok(HandlerResponse::ok(serde_json::json!({
                "message": "Glue job triggered successfully",
                "jobRunId": job_run_id,
            }))),
            Err(e) => {
                error!(error = %e, "Glue trigger failed");
                Ok(HandlerResponse::failure(format!(
                    "Error triggering Glue job: {}",
                    e
                )))
            }
        }
    }

    async fn start_job(&self, event: &S3Event) -> Result<String, TagscopeError> {
        let (bucket, key) = first_record(event)?;
        let input_path = format!("s3://{}/{}", bucket, key);
        let output_path = derive_output_path(&self.config.output_bucket, &key, Utc::now());
        info!(
            job_name = %self.config.job_name,
            input_path = %input_path,
            output_path = %output_path,
            "Starting Glue job"
        );

        let response = self
            .glue
            .start_job_run()
            .job_name(&self.config.job_name)
            .arguments("--input_path", &input_path)
            .arguments("--output_path", &output_path)
            .send()
            .await
            .map_err(|e| {
                TagscopeError::Trigger(format!("StartJobRun failed: {}", DisplayErrorContext(&e)))
            })?;

        let job_run_id = response
            .job_run_id()
            .ok_or_else(|| TagscopeError::Trigger("no job run id returned".into()))?
            .to_string();
        info!(job_run_id = %job_run_id, "Glue job started");
        Ok(job_run_id)
    }
}
