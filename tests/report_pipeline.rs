//! End-to-end tests of the tagging report handler against fake AWS
//! clients: both queries run, the report renders, and one raw email
//! goes out — or everything collapses into the 500 contract.

use std::time::Duration;

use aws_sdk_athena::operation::get_query_execution::GetQueryExecutionOutput;
use aws_sdk_athena::operation::start_query_execution::StartQueryExecutionOutput;
use aws_sdk_athena::types::{QueryExecution, QueryExecutionState, QueryExecutionStatus};
use aws_sdk_s3::operation::get_object::GetObjectOutput;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_sesv2::operation::send_email::SendEmailOutput;
use aws_smithy_mocks::{mock, mock_client, RuleMode};
use chrono::NaiveDate;
use lambda_runtime::{Context, LambdaEvent};

use tagscope::athena::{PollSettings, QueryExecutor};
use tagscope::config::ReporterConfig;
use tagscope::email::ReportDispatcher;
use tagscope::pipeline::ReportPipeline;

const RESULT_CSV: &[u8] = b"service,total_resources,total_cost,tagged_resources,tagged_cost,untagged_resources,untagged_cost\n\
AmazonEC2,10,100.0,6,70.0,4,30.0\n";

fn config() -> ReporterConfig {
    ReporterConfig {
        database: "cur_db".into(),
        table: "cur_table".into(),
        workgroup: "primary".into(),
        output_bucket: "athena-results".into(),
        sender_email: "reports@example.com".into(),
        recipients: vec!["ops@example.com".into()],
        tag_key: "user_project".into(),
        billing_period: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
    }
}

fn fast_poll() -> PollSettings {
    PollSettings {
        interval: Duration::ZERO,
        max_attempts: 3,
    }
}

fn execution_output(state: QueryExecutionState, reason: Option<&str>) -> GetQueryExecutionOutput {
    let mut status = QueryExecutionStatus::builder().state(state);
    if let Some(reason) = reason {
        status = status.state_change_reason(reason);
    }
    GetQueryExecutionOutput::builder()
        .query_execution(
            QueryExecution::builder()
                .query_execution_id("qe-1")
                .status(status.build())
                .build(),
        )
        .build()
}

fn empty_event() -> LambdaEvent<serde_json::Value> {
    LambdaEvent::new(serde_json::json!({}), Context::default())
}

#[tokio::test]
async fn test_successful_run_sends_one_email() {
    let start = mock!(aws_sdk_athena::Client::start_query_execution).then_output(|| {
        StartQueryExecutionOutput::builder()
            .query_execution_id("qe-1")
            .build()
    });
    let get = mock!(aws_sdk_athena::Client::get_query_execution)
        .then_output(|| execution_output(QueryExecutionState::Succeeded, None));
    let athena = mock_client!(aws_sdk_athena, RuleMode::MatchAny, [&start, &get]);

    let get_object = mock!(aws_sdk_s3::Client::get_object).then_output(|| {
        GetObjectOutput::builder()
            .body(ByteStream::from_static(RESULT_CSV))
            .build()
    });
    let s3 = mock_client!(aws_sdk_s3, RuleMode::MatchAny, [&get_object]);

    let send = mock!(aws_sdk_sesv2::Client::send_email)
        .then_output(|| SendEmailOutput::builder().message_id("msg-1").build());
    let ses = mock_client!(aws_sdk_sesv2, [&send]);

    let config = config();
    let executor = QueryExecutor::new(
        athena,
        s3,
        config.database.clone(),
        config.workgroup.clone(),
        config.output_bucket.clone(),
    )
    .with_poll_settings(fast_poll());
    let dispatcher = ReportDispatcher::new(ses, config.sender_email.clone(), config.recipients.clone());
    let pipeline = ReportPipeline::new(executor, dispatcher, config);

    let response = pipeline.handle(empty_event()).await.unwrap();

    assert_eq!(response.status_code, 200);
    let body: serde_json::Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(
        body["message"],
        "Tagging analysis executed and report sent"
    );
    assert_eq!(body["sesMessageId"], "msg-1");

    // Two queries submitted and polled, two result artifacts fetched,
    // exactly one email sent.
    assert_eq!(start.num_calls(), 2);
    assert_eq!(get.num_calls(), 2);
    assert_eq!(get_object.num_calls(), 2);
    assert_eq!(send.num_calls(), 1);
}

#[tokio::test]
async fn test_failed_query_returns_500_and_sends_nothing() {
    let start = mock!(aws_sdk_athena::Client::start_query_execution).then_output(|| {
        StartQueryExecutionOutput::builder()
            .query_execution_id("qe-1")
            .build()
    });
    let get = mock!(aws_sdk_athena::Client::get_query_execution)
        .then_output(|| execution_output(QueryExecutionState::Failed, Some("SYNTAX_ERROR")));
    let athena = mock_client!(aws_sdk_athena, [&start, &get]);

    let get_object =
        mock!(aws_sdk_s3::Client::get_object).then_output(|| GetObjectOutput::builder().build());
    let s3 = mock_client!(aws_sdk_s3, [&get_object]);

    let send = mock!(aws_sdk_sesv2::Client::send_email)
        .then_output(|| SendEmailOutput::builder().build());
    let ses = mock_client!(aws_sdk_sesv2, [&send]);

    let config = config();
    let executor = QueryExecutor::new(
        athena,
        s3,
        config.database.clone(),
        config.workgroup.clone(),
        config.output_bucket.clone(),
    )
    .with_poll_settings(fast_poll());
    let dispatcher = ReportDispatcher::new(ses, config.sender_email.clone(), config.recipients.clone());
    let pipeline = ReportPipeline::new(executor, dispatcher, config);

    let response = pipeline.handle(empty_event()).await.unwrap();

    assert_eq!(response.status_code, 500);
    let body: serde_json::Value = serde_json::from_str(&response.body).unwrap();
    let message = body["message"].as_str().unwrap();
    assert!(message.starts_with("Error: "), "got: {}", message);
    assert!(message.contains("SYNTAX_ERROR"), "got: {}", message);

    // The first query failed, so nothing further ran.
    assert_eq!(start.num_calls(), 1);
    assert_eq!(get_object.num_calls(), 0);
    assert_eq!(send.num_calls(), 0);
}

#[tokio::test]
async fn test_invalid_table_name_fails_before_any_query() {
    let start = mock!(aws_sdk_athena::Client::start_query_execution).then_output(|| {
        StartQueryExecutionOutput::builder()
            .query_execution_id("qe-1")
            .build()
    });
    let athena = mock_client!(aws_sdk_athena, [&start]);
    let get_object =
        mock!(aws_sdk_s3::Client::get_object).then_output(|| GetObjectOutput::builder().build());
    let s3 = mock_client!(aws_sdk_s3, [&get_object]);
    let send = mock!(aws_sdk_sesv2::Client::send_email)
        .then_output(|| SendEmailOutput::builder().build());
    let ses = mock_client!(aws_sdk_sesv2, [&send]);

    let mut config = config();
    config.table = "cur_table; DROP TABLE users".into();
    let executor = QueryExecutor::new(
        athena,
        s3,
        config.database.clone(),
        config.workgroup.clone(),
        config.output_bucket.clone(),
    )
    .with_poll_settings(fast_poll());
    let dispatcher = ReportDispatcher::new(ses, config.sender_email.clone(), config.recipients.clone());
    let pipeline = ReportPipeline::new(executor, dispatcher, config);

    let response = pipeline.handle(empty_event()).await.unwrap();

    assert_eq!(response.status_code, 500);
    assert_eq!(start.num_calls(), 0);
    assert_eq!(send.num_calls(), 0);
}
