//! Tagging compliance reporting and S3-triggered job handlers for AWS
//! cost and usage data. Each binary in `src/bin/` wires one Lambda
//! entrypoint to the components in this library.

pub mod athena;
pub mod config;
pub mod email;
pub mod errors;
pub mod handler;
pub mod labeler;
pub mod pipeline;
pub mod report;
pub mod triggers;
