use thiserror::Error;

#[derive(Debug, Error)]
pub enum TagscopeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Query submission error: {0}")]
    QuerySubmit(String),

    #[error("Query {execution_id} failed in state {state}: {reason}")]
    QueryExecution {
        execution_id: String,
        state: String,
        reason: String,
    },

    #[error("Query {execution_id} still running after {attempts} polls, giving up")]
    QueryTimeout { execution_id: String, attempts: u32 },

    #[error("Query {execution_id} cancelled by caller")]
    QueryCancelled { execution_id: String },

    #[error("Result fetch error: {0}")]
    ResultFetch(String),

    #[error("Email error: {0}")]
    Email(String),

    #[error("Trigger error: {0}")]
    Trigger(String),

    #[error("Label detection error: {0}")]
    Detection(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}
