// Error types for Executor module

use thiserror::Error;

/// Executor error types
///
/// Every variant is converted into a failed `ExecutionResult` at the
/// `ExecutionService` boundary; the display text becomes the message.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("{0}")]
    PolicyRejected(String),

    #[error("empty command")]
    EmptyCommand,

    #[error("Failed to spawn '{0}': {1}")]
    SpawnFailed(String, String),

    #[error("Failed to wait on '{0}': {1}")]
    WaitFailed(String, String),

    #[error("Command '{0:?}' timed out after {1} seconds")]
    Timeout(Vec<String>, u64),

    #[error("Workflow script '{0}' is outside the workflows directory")]
    OutsideWorkflowsDir(String),

    #[error("Missing '{0}' field in request")]
    MissingField(&'static str),
}

pub type Result<T> = std::result::Result<T, ExecutorError>;
