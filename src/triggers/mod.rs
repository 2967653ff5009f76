//! S3-upload-triggered job handlers: one starts a Glue job run, one
//! starts a Step Functions execution. Both derive timestamped output
//! paths from the uploaded object.

pub mod glue;
pub mod sfn;

pub use glue::GlueTrigger;
pub use sfn::StateMachineTrigger;

use chrono::{DateTime, Utc};

use crate::handler::object_stem;

/// Output location for one derived dataset, timestamped so repeated
/// uploads of the same file never overwrite each other.
pub fn derive_output_path(output_bucket: &str, key: &str, now: DateTime<Utc>) -> String {
    format!(
        "s3://{}/data/{}_{}",
        output_bucket,
        object_stem(key),
        now.format("%Y%m%d%H%M%S")
    )
}
