//! Shared Lambda plumbing: the `{statusCode, body}` response contract
//! and S3 event record helpers.

use aws_lambda_events::event::s3::S3Event;
use percent_encoding::percent_decode_str;
use serde::Serialize;

use crate::errors::TagscopeError;

/// The response shape every handler in this crate returns: 200 with a
/// JSON body on success, 500 with an `Error: ...` message on failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerResponse {
    pub status_code: u16,
    pub body: String,
}

impl HandlerResponse {
    pub fn ok(body: serde_json::Value) -> Self {
        Self {
            status_code: 200,
            body: body.to_string(),
        }
    }

    pub fn failure(message: String) -> Self {
        Self {
            status_code: 500,
            body: serde_json::json!({ "message": message }).to_string(),
        }
    }
}

/// Bucket and decoded object key of the first record in an S3 event.
/// Events with no records are a handled error, not a panic.
pub fn first_record(event: &S3Event) -> Result<(String, String), TagscopeError> {
    let record = event
        .records
        .first()
        .ok_or_else(|| TagscopeError::Trigger("no records in S3 event".into()))?;
    let bucket = record
        .s3
        .bucket
        .name
        .clone()
        .ok_or_else(|| TagscopeError::Trigger("no bucket name in S3 event".into()))?;
    let key = record
        .s3
        .object
        .key
        .clone()
        .ok_or_else(|| TagscopeError::Trigger("no object key in S3 event".into()))?;
    Ok((bucket, decode_key(&key)))
}

/// S3 event keys arrive URL-encoded with `+` for spaces.
pub fn decode_key(raw: &str) -> String {
    percent_decode_str(&raw.replace('+', " "))
        .decode_utf8_lossy()
        .into_owned()
}

/// File name without directories or extension, as used in derived output
/// paths and execution names.
pub fn object_stem(key: &str) -> &str {
    let name = key.rsplit('/').next().unwrap_or(key);
    name.split('.').next().unwrap_or(name)
}
