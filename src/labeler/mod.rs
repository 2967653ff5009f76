//! Rekognition-backed image labeling: detect labels for each uploaded
//! image and persist one DynamoDB item per label.

use aws_lambda_events::event::s3::S3Event;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_rekognition::types::{Image, S3Object};
use lambda_runtime::{Error, LambdaEvent};
use tracing::{error, info};

use crate::config::LabelerConfig;
use crate::errors::TagscopeError;
use crate::handler::{decode_key, HandlerResponse};

const MAX_LABELS: i32 = 5;
const MIN_CONFIDENCE: f32 = 96.0;

pub struct ImageLabeler {
    rekognition: aws_sdk_rekognition::Client,
    dynamodb: aws_sdk_dynamodb::Client,
    config: LabelerConfig,
}

impl ImageLabeler {
    pub fn new(
        rekognition: aws_sdk_rekognition::Client,
        dynamodb: aws_sdk_dynamodb::Client,
        config: LabelerConfig,
    ) -> Self {
        Self {
            rekognition,
            dynamodb,
            config,
        }
    }

    pub async fn handle(&self, event: LambdaEvent<S3Event>) -> Result<HandlerResponse, Error> {
        match self.label_records(&event.payload).await {
            Ok(labels) => Ok(HandlerResponse::ok(serde_json::json!({
                "message": "Images labeled successfully",
                "labelsStored": labels,
            }))),
            Err(e) => {
                error!(error = %e, "Image labeling failed");
                Ok(HandlerResponse::failure(format!("Error: {}", e)))
            }
        }
    }

    /// Label every record in the event; the first failure aborts the
    /// invocation.
    async fn label_records(&self, event: &S3Event) -> Result<usize, TagscopeError> {
        let mut stored = 0;
        for record in &event.records {
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
                .map(|k| decode_key(&k))
                .ok_or_else(|| TagscopeError::Trigger("no object key in S3 event".into()))?;
            stored += self.label_object(&bucket, &key).await?;
        }
        Ok(stored)
    }

    async fn label_object(&self, bucket: &str, key: &str) -> Result<usize, TagscopeError> {
        let response = self
            .rekognition
            .detect_labels()
            .image(
                Image::builder()
                    .s3_object(S3Object::builder().bucket(bucket).name(key).build())
                    .build(),
            )
            .max_labels(MAX_LABELS)
            .min_confidence(MIN_CONFIDENCE)
            .send()
            .await
            .map_err(|e| {
                TagscopeError::Detection(format!(
                    "DetectLabels failed for s3://{}/{}: {}",
                    bucket,
                    key,
                    aws_sdk_rekognition::error::DisplayErrorContext(&e)
                ))
            })?;

        let labels = response.labels();
        info!(bucket = %bucket, key = %key, labels = labels.len(), "Detected labels");

        for label in labels {
            let name = match label.name() {
                Some(name) => name.to_string(),
                None => continue,
            };
            let confidence = label.confidence().unwrap_or(0.0);
            self.dynamodb
                .put_item()
                .table_name(&self.config.table_name)
                .item("image-id", AttributeValue::S(key.to_string()))
                .item("tag", AttributeValue::S(name.clone()))
                .item("conf", AttributeValue::N(confidence.to_string()))
                .send()
                .await
                .map_err(|e| {
                    TagscopeError::Database(format!(
                        "PutItem failed for {}/{}: {}",
                        key,
                        name,
                        aws_sdk_dynamodb::error::DisplayErrorContext(&e)
                    ))
                })?;
        }
        Ok(labels.len())
    }
}
