use aws_sdk_sesv2::error::DisplayErrorContext;
use aws_sdk_sesv2::primitives::Blob;
use aws_sdk_sesv2::types::{Destination, EmailContent, RawMessage};
use tracing::info;

use super::message::EmailReport;
use crate::errors::TagscopeError;

/// Sends one assembled report through SES. The client, sender, and
/// recipient list are injected at construction.
pub struct ReportDispatcher {
    ses: aws_sdk_sesv2::Client,
    sender: String,
    recipients: Vec<String>,
}

impl ReportDispatcher {
    pub fn new(ses: aws_sdk_sesv2::Client, sender: impl Into<String>, recipients: Vec<String>) -> Self {
        Self {
            ses,
            sender: sender.into(),
            recipients,
        }
    }

    /// Send the report as one raw MIME message, returning the provider
    /// message id. Delivery is all-or-nothing; there is no retry.
    pub async fn send(&self, report: &EmailReport) -> Result<String, TagscopeError> {
        if self.recipients.is_empty() {
            return Err(TagscopeError::Email("no recipients configured".into()));
        }

        let raw = report.to_raw_mime(&self.sender, &self.recipients);
        let raw_message = RawMessage::builder()
            .data(Blob::new(raw.into_bytes()))
            .build()
            .map_err(|e| TagscopeError::Email(format!("assembling raw message: {}", e)))?;

        let response = self
            .ses
            .send_email()
            .from_email_address(&self.sender)
            .destination(
                Destination::builder()
                    .set_to_addresses(Some(self.recipients.clone()))
                    .build(),
            )
            .content(EmailContent::builder().raw(raw_message).build())
            .send()
            .await
            .map_err(|e| {
                TagscopeError::Email(format!("SendEmail failed: {}", DisplayErrorContext(&e)))
            })?;

        let message_id = response.message_id().unwrap_or_default().to_string();
        info!(
            message_id = %message_id,
            recipients = self.recipients.len(),
            attachments = report.attachments.len(),
            "Report email sent"
        );
        Ok(message_id)
    }
}
