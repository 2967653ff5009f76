use std::fmt;
use std::time::Duration;

use aws_sdk_athena::error::DisplayErrorContext;
use aws_sdk_athena::types::{QueryExecutionContext, QueryExecutionState};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::types::QueryResult;
use crate::errors::TagscopeError;

/// Poll interval and deadline for one query execution. The defaults
/// match the 5-minute ceiling the report Lambda runs under.
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 60,
        }
    }
}

/// Lifecycle of one query execution as seen by the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    Submitted,
    Polling,
    Succeeded,
    Failed,
    Cancelled,
    TimedOut,
}

impl QueryState {
    fn from_provider(state: &QueryExecutionState) -> QueryState {
        match state {
            QueryExecutionState::Succeeded => QueryState::Succeeded,
            QueryExecutionState::Queued | QueryExecutionState::Running => QueryState::Polling,
            QueryExecutionState::Cancelled => QueryState::Cancelled,
            _ => QueryState::Failed,
        }
    }
}

impl fmt::Display for QueryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QueryState::Submitted => "SUBMITTED",
            QueryState::Polling => "POLLING",
            QueryState::Succeeded => "SUCCEEDED",
            QueryState::Failed => "FAILED",
            QueryState::Cancelled => "CANCELLED",
            QueryState::TimedOut => "TIMED_OUT",
        };
        f.write_str(name)
    }
}

/// Submits queries against one database/workgroup pair and polls them to
/// a terminal state. Clients are injected so tests can substitute fakes.
pub struct QueryExecutor {
    athena: aws_sdk_athena::Client,
    s3: aws_sdk_s3::Client,
    database: String,
    workgroup: String,
    output_bucket: String,
    poll: PollSettings,
}

impl QueryExecutor {
    pub fn new(
        athena: aws_sdk_athena::Client,
        s3: aws_sdk_s3::Client,
        database: impl Into<String>,
        workgroup: impl Into<String>,
        output_bucket: impl Into<String>,
    ) -> Self {
        Self {
            athena,
            s3,
            database: database.into(),
            workgroup: workgroup.into(),
            output_bucket: output_bucket.into(),
            poll: PollSettings::default(),
        }
    }

    pub fn with_poll_settings(mut self, poll: PollSettings) -> Self {
        self.poll = poll;
        self
    }

    /// Run a query to completion and parse its result artifact.
    pub async fn execute(&self, query: &str) -> Result<QueryResult, TagscopeError> {
        self.execute_with_cancel(query, &CancellationToken::new())
            .await
    }

    /// Like [`execute`](Self::execute), but aborts the poll loop when the
    /// token fires. A cancelled or timed-out query is stopped server-side
    /// on a best-effort basis so it does not keep scanning unattended.
    pub async fn execute_with_cancel(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<QueryResult, TagscopeError> {
        let start = self
            .athena
            .start_query_execution()
            .query_string(query)
            .query_execution_context(
                QueryExecutionContext::builder()
                    .database(&self.database)
                    .build(),
            )
            .work_group(&self.workgroup)
            .send()
            .await
            .map_err(|e| {
                TagscopeError::QuerySubmit(format!(
                    "StartQueryExecution failed: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        let execution_id = start
            .query_execution_id()
            .ok_or_else(|| TagscopeError::QuerySubmit("no query execution id returned".into()))?
            .to_string();
        info!(query_execution_id = %execution_id, "Started query execution");

        for attempt in 0..self.poll.max_attempts {
            if cancel.is_cancelled() {
                self.stop(&execution_id).await;
                return Err(TagscopeError::QueryCancelled { execution_id });
            }

            let response = self
                .athena
                .get_query_execution()
                .query_execution_id(&execution_id)
                .send()
                .await
                .map_err(|e| {
                    TagscopeError::QuerySubmit(format!(
                        "GetQueryExecution failed: {}",
                        DisplayErrorContext(&e)
                    ))
                })?;

            let execution = response.query_execution();
            let status = execution.and_then(|e| e.status());
            let provider_state = status.and_then(|s| s.state()).cloned();
            let state = provider_state
                .as_ref()
                .map(QueryState::from_provider)
                .unwrap_or(QueryState::Polling);
            debug!(query_execution_id = %execution_id, attempt, state = %state, "Polled query execution");

            match state {
                QueryState::Succeeded => {
                    let data_scanned_bytes = execution
                        .and_then(|e| e.statistics())
                        .and_then(|s| s.data_scanned_in_bytes())
                        .unwrap_or(0);
                    let mut result = self.fetch_result(&execution_id).await?;
                    result.data_scanned_bytes = data_scanned_bytes;
                    info!(
                        query_execution_id = %execution_id,
                        rows = result.rows.len(),
                        data_scanned_bytes,
                        "Query succeeded"
                    );
                    return Ok(result);
                }
                QueryState::Failed | QueryState::Cancelled => {
                    let reason = status
                        .and_then(|s| s.state_change_reason())
                        .unwrap_or("Unknown error")
                        .to_string();
                    return Err(TagscopeError::QueryExecution {
                        execution_id,
                        state: provider_state
                            .as_ref()
                            .map(|s| s.as_str().to_string())
                            .unwrap_or_else(|| state.to_string()),
                        reason,
                    });
                }
                _ => {
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            self.stop(&execution_id).await;
                            return Err(TagscopeError::QueryCancelled { execution_id });
                        }
                        _ = tokio::time::sleep(self.poll.interval) => {}
                    }
                }
            }
        }

        warn!(query_execution_id = %execution_id, attempts = self.poll.max_attempts, "Query poll deadline exhausted");
        self.stop(&execution_id).await;
        Err(TagscopeError::QueryTimeout {
            execution_id,
            attempts: self.poll.max_attempts,
        })
    }

    /// Best-effort StopQueryExecution; a failure to stop only logs.
    async fn stop(&self, execution_id: &str) {
        if let Err(e) = self
            .athena
            .stop_query_execution()
            .query_execution_id(execution_id)
            .send()
            .await
        {
            warn!(
                query_execution_id = %execution_id,
                error = %DisplayErrorContext(&e),
                "Failed to stop query execution"
            );
        }
    }

    /// Fetch and parse the CSV artifact Athena writes for a succeeded
    /// execution.
    async fn fetch_result(&self, execution_id: &str) -> Result<QueryResult, TagscopeError> {
        let key = format!("{}.csv", execution_id);
        let object = self
            .s3
            .get_object()
            .bucket(&self.output_bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| {
                TagscopeError::ResultFetch(format!(
                    "s3://{}/{}: {}",
                    self.output_bucket,
                    key,
                    DisplayErrorContext(&e)
                ))
            })?;

        let bytes = object
            .body
            .collect()
            .await
            .map_err(|e| TagscopeError::ResultFetch(format!("reading result body: {}", e)))?
            .into_bytes();

        QueryResult::from_csv(execution_id, &bytes)
    }
}
