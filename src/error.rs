use thiserror::Error;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("unknown job name: {0}")]
    UnknownJob(String),

    #[error("{message}")]
    Handler { code: String, message: String },

    #[error("no queue store is bound; call Controller::bind first")]
    NotConfigured,
}

impl ProcessorError {
    /// Classification code recorded in the `errorCode` column of a failed job.
    pub fn code(&self) -> &str {
        match self {
            ProcessorError::Store(_) => "StoreIOError",
            ProcessorError::UnknownJob(_) => "UnknownJob",
            ProcessorError::Handler { code, .. } => code,
            ProcessorError::NotConfigured => "ConfigurationError",
        }
    }
}

/// Failure raised by a job handler, carrying the classification code and a
/// human-readable message. Both are recorded verbatim (truncated) on the job row.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct HandlerError {
    pub code: String,
    pub message: String,
}

impl HandlerError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn missing_field(field: &str) -> Self {
        Self::new("MissingField", format!("{field} is required in the payload"))
    }
}

pub type Result<T> = std::result::Result<T, ProcessorError>;
