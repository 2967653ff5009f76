use chrono::{Datelike, NaiveDate, Utc};

use crate::errors::TagscopeError;

/// Configuration for the tagging compliance reporter, read from the
/// Lambda environment at startup. All values are validated up front so a
/// misconfigured function fails before submitting any query.
#[derive(Debug, Clone)]
pub struct ReporterConfig {
    pub database: String,
    pub table: String,
    pub workgroup: String,
    pub output_bucket: String,
    pub sender_email: String,
    pub recipients: Vec<String>,
    pub tag_key: String,
    pub billing_period: NaiveDate,
}

impl ReporterConfig {
    pub fn from_env() -> Result<Self, TagscopeError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, TagscopeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            database: required(&lookup, "DATABASE_NAME")?,
            table: required(&lookup, "TABLE_NAME")?,
            workgroup: required(&lookup, "WORKGROUP")?,
            output_bucket: required(&lookup, "OUTPUT_BUCKET")?,
            sender_email: required(&lookup, "SENDER_EMAIL")?,
            recipients: parse_recipients(&required(&lookup, "RECIPIENT_EMAILS")?)?,
            tag_key: required(&lookup, "TAG_KEY_TO_ANALYZE")?,
            billing_period: parse_billing_period(lookup("BILLING_PERIOD"))?,
        })
    }
}

/// Configuration for the Glue job trigger.
#[derive(Debug, Clone)]
pub struct GlueTriggerConfig {
    pub job_name: String,
    pub output_bucket: String,
}

impl GlueTriggerConfig {
    pub fn from_env() -> Result<Self, TagscopeError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, TagscopeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            job_name: required(&lookup, "GLUE_JOB_NAME")?,
            output_bucket: required(&lookup, "OUTPUT_BUCKET")?,
        })
    }
}

/// Configuration for the Step Functions trigger.
#[derive(Debug, Clone)]
pub struct SfnTriggerConfig {
    pub state_machine_arn: String,
    pub output_bucket: String,
}

impl SfnTriggerConfig {
    pub fn from_env() -> Result<Self, TagscopeError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, TagscopeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            state_machine_arn: required(&lookup, "STATE_MACHINE_ARN")?,
            output_bucket: required(&lookup, "OUTPUT_BUCKET")?,
        })
    }
}

/// Configuration for the image labeler.
#[derive(Debug, Clone)]
pub struct LabelerConfig {
    pub table_name: String,
}

impl LabelerConfig {
    pub fn from_env() -> Result<Self, TagscopeError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, TagscopeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            table_name: required(&lookup, "DYNAMODB_TABLE")?,
        })
    }
}

fn required<F>(lookup: &F, key: &str) -> Result<String, TagscopeError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(TagscopeError::Config(format!("{} is not set", key))),
    }
}

/// Split a comma-separated recipient list, dropping empty entries. An
/// empty result is a configuration error: a report nobody receives is a
/// misconfiguration, not a success.
fn parse_recipients(raw: &str) -> Result<Vec<String>, TagscopeError> {
    let recipients: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect();

    if recipients.is_empty() {
        return Err(TagscopeError::Config(
            "RECIPIENT_EMAILS contains no usable addresses".into(),
        ));
    }
    Ok(recipients)
}

/// Parse `BILLING_PERIOD` as `YYYY-MM-DD`, defaulting to the first day
/// of the current month when unset.
fn parse_billing_period(raw: Option<String>) -> Result<NaiveDate, TagscopeError> {
    match raw {
        Some(value) if !value.trim().is_empty() => {
            NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|e| {
                TagscopeError::Config(format!(
                    "BILLING_PERIOD must be YYYY-MM-DD, got {:?}: {}",
                    value, e
                ))
            })
        }
        _ => {
            let today = Utc::now().date_naive();
            Ok(today.with_day(1).unwrap_or(today))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn reporter_vars() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("DATABASE_NAME", "cur_db"),
            ("TABLE_NAME", "cur_table"),
            ("WORKGROUP", "primary"),
            ("OUTPUT_BUCKET", "athena-results"),
            ("SENDER_EMAIL", "reports@example.com"),
            ("RECIPIENT_EMAILS", "a@example.com, b@example.com"),
            ("TAG_KEY_TO_ANALYZE", "user_project"),
            ("BILLING_PERIOD", "2025-06-01"),
        ])
    }

    fn lookup_in(
        vars: HashMap<&'static str, &'static str>,
    ) -> impl Fn(&str) -> Option<String> {
        move |key| vars.get(key).map(|v| v.to_string())
    }

    #[test]
    fn test_reporter_config_parses_all_fields() {
        let config = ReporterConfig::from_lookup(lookup_in(reporter_vars())).unwrap();
        assert_eq!(config.database, "cur_db");
        assert_eq!(config.table, "cur_table");
        assert_eq!(config.recipients, vec!["a@example.com", "b@example.com"]);
        assert_eq!(
            config.billing_period,
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
        );
    }

    #[test]
    fn test_reporter_config_missing_database_fails() {
        let mut vars = reporter_vars();
        vars.remove("DATABASE_NAME");
        let err = ReporterConfig::from_lookup(lookup_in(vars)).unwrap_err();
        assert!(err.to_string().contains("DATABASE_NAME"));
    }

    #[test]
    fn test_recipients_are_trimmed() {
        let recipients = parse_recipients("  a@example.com ,, b@example.com ,").unwrap();
        assert_eq!(recipients, vec!["a@example.com", "b@example.com"]);
    }

    #[test]
    fn test_empty_recipient_list_fails_fast() {
        assert!(parse_recipients("").is_err());
        assert!(parse_recipients(" , ,  ").is_err());
    }

    #[test]
    fn test_billing_period_defaults_to_first_of_month() {
        let period = parse_billing_period(None).unwrap();
        assert_eq!(period.day(), 1);
    }

    #[test]
    fn test_billing_period_rejects_garbage() {
        assert!(parse_billing_period(Some("June 2025".into())).is_err());
        assert!(parse_billing_period(Some("2025-13-01".into())).is_err());
    }

    #[test]
    fn test_glue_trigger_config_requires_job_name() {
        let vars = HashMap::from([("OUTPUT_BUCKET", "out")]);
        assert!(GlueTriggerConfig::from_lookup(lookup_in(vars)).is_err());
    }

    #[test]
    fn test_sfn_trigger_config_requires_arn() {
        let vars = HashMap::from([("OUTPUT_BUCKET", "out")]);
        let err = SfnTriggerConfig::from_lookup(lookup_in(vars)).unwrap_err();
        assert!(err.to_string().contains("STATE_MACHINE_ARN"));
    }

    #[test]
    fn test_whitespace_only_value_counts_as_unset() {
        let mut vars = reporter_vars();
        vars.insert("WORKGROUP", "   ");
        assert!(ReporterConfig::from_lookup(lookup_in(vars)).is_err());
    }
}
