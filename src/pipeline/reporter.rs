use lambda_runtime::{Error, LambdaEvent};
use tracing::{error, info};

use crate::athena::{QueryExecutor, TaggingQueries};
use crate::config::ReporterConfig;
use crate::email::{Attachment, EmailReport, ReportDispatcher};
use crate::errors::TagscopeError;
use crate::handler::HandlerResponse;
use crate::report::{render_report, result_to_csv, ReportSummary};

/// The tagging compliance report pipeline: build the two queries, run
/// them sequentially, render the report, send it. One error boundary
/// covers the whole run; there is no partial-success path.
pub struct ReportPipeline {
    executor: QueryExecutor,
    dispatcher: ReportDispatcher,
    config: ReporterConfig,
}

impl ReportPipeline {
    pub fn new(
        executor: QueryExecutor,
        dispatcher: ReportDispatcher,
        config: ReporterConfig,
    ) -> Self {
        Self {
            executor,
            dispatcher,
            config,
        }
    }

    /// Lambda entrypoint. The event payload carries no required fields;
    /// any failure maps to the 500 response with the error text.
    pub async fn handle(
        &self,
        event: LambdaEvent<serde_json::Value>,
    ) -> Result<HandlerResponse, Error> {
        info!(request_id = %event.context.request_id, "Starting tagging compliance report");
        match self.run().await {
            Ok(message_id) => Ok(HandlerResponse::ok(serde_json::json!({
                "message": "Tagging analysis executed and report sent",
                "sesMessageId": message_id,
            }))),
            Err(e) => {
                error!(error = %e, "Report pipeline failed");
                Ok(HandlerResponse::failure(format!("Error: {}", e)))
            }
        }
    }

    async fn run(&self) -> Result<String, TagscopeError> {
        let queries = TaggingQueries::build(&self.config)?;

        info!("Running tagged vs. untagged aggregation query");
        let by_service = self.executor.execute(&queries.tagged_vs_untagged).await?;
        info!("Running expensive untagged resources query");
        let expensive = self.executor.execute(&queries.expensive_untagged).await?;

        let summary = ReportSummary::from_rows(&by_service.rows);
        info!(
            services = by_service.rows.len(),
            untagged_resources = summary.untagged_resources,
            "Rendering report"
        );

        let html_body = render_report(
            self.config.billing_period,
            &self.config.tag_key,
            &summary,
            &by_service,
            &expensive,
        );

        let mut attachments = Vec::new();
        for (filename, result) in [
            ("tagged_vs_untagged.csv", &by_service),
            ("expensive_untagged.csv", &expensive),
        ] {
            if result.is_empty() {
                continue;
            }
            attachments.push(Attachment {
                filename: filename.to_string(),
                content: result_to_csv(result)?,
            });
        }

        let report = EmailReport {
            subject: format!(
                "AWS Cost and Usage Report - Tagging Analysis ({})",
                self.config.billing_period.format("%Y-%m-%d")
            ),
            html_body,
            attachments,
        };

        self.dispatcher.send(&report).await
    }
}
