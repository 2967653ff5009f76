pub mod types;

pub use types::{GlueTriggerConfig, LabelerConfig, ReporterConfig, SfnTriggerConfig};
