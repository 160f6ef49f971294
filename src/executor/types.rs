// Data types for Executor module

use crate::executor::error::{ExecutorError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Wall-clock budget for workflow scripts and install commands
pub const LONG_RUN_TIMEOUT: Duration = Duration::from_secs(300);

/// Wall-clock budget for ad-hoc commands
pub const AD_HOC_TIMEOUT: Duration = Duration::from_secs(30);

/// Which operation a request targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// Run a script from the workflows directory
    WorkflowRun,
    /// Run a whitelisted package-install command
    ToolInstall,
    /// Run an arbitrary command line
    AdHocRun,
}

impl CommandKind {
    /// Budget applied to every process started for this kind
    pub fn timeout(self) -> Duration {
        match self {
            Self::WorkflowRun | Self::ToolInstall => LONG_RUN_TIMEOUT,
            Self::AdHocRun => AD_HOC_TIMEOUT,
        }
    }

    /// Name of the JSON body field carrying the payload
    pub fn payload_field(self) -> &'static str {
        match self {
            Self::WorkflowRun => "script",
            Self::ToolInstall | Self::AdHocRun => "command",
        }
    }
}

/// A single execution request, immutable once built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    kind: CommandKind,
    payload: String,
}

impl CommandRequest {
    pub fn new(kind: CommandKind, payload: impl Into<String>) -> Self {
        Self {
            kind,
            payload: payload.into(),
        }
    }

    /// Build from an optional body field, failing when the field was absent
    pub fn from_field(kind: CommandKind, payload: Option<String>) -> Result<Self> {
        payload
            .map(|p| Self::new(kind, p))
            .ok_or(ExecutorError::MissingField(kind.payload_field()))
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    /// Script filename for `WorkflowRun`, full command line otherwise
    pub fn payload(&self) -> &str {
        &self.payload
    }
}

/// Uniform envelope returned by every execution operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    #[serde(rename = "success")]
    pub succeeded: bool,
    pub message: String,
}

impl ExecutionResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            succeeded: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            message: message.into(),
        }
    }
}

impl From<Result<String>> for ExecutionResult {
    fn from(result: Result<String>) -> Self {
        match result {
            Ok(message) => Self::success(message),
            Err(e) => Self::failure(e.to_string()),
        }
    }
}

/// Output captured from a process that ran to completion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    /// Whether the process exited with status zero
    pub exited_normally: bool,
    /// Exit code, `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Outcome of a single process invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed(CapturedOutput),
    TimedOut,
    SpawnFailed(String),
    /// Spawned, but waiting on the child failed
    WaitFailed(String),
}

impl RunOutcome {
    /// Convert into captured output, mapping failures to executor errors
    pub fn into_output(self, argv: &[String], timeout: Duration) -> Result<CapturedOutput> {
        match self {
            Self::Completed(output) => Ok(output),
            Self::TimedOut => Err(ExecutorError::Timeout(argv.to_vec(), timeout.as_secs())),
            Self::SpawnFailed(reason) => Err(ExecutorError::SpawnFailed(
                argv.first().cloned().unwrap_or_default(),
                reason,
            )),
            Self::WaitFailed(reason) => Err(ExecutorError::WaitFailed(
                argv.first().cloned().unwrap_or_default(),
                reason,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budgets_per_kind() {
        assert_eq!(CommandKind::WorkflowRun.timeout(), Duration::from_secs(300));
        assert_eq!(CommandKind::ToolInstall.timeout(), Duration::from_secs(300));
        assert_eq!(CommandKind::AdHocRun.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_result_serializes_as_success_field() {
        let json = serde_json::to_value(ExecutionResult::success("ok")).unwrap();
        assert_eq!(json, serde_json::json!({ "success": true, "message": "ok" }));
    }

    #[test]
    fn test_missing_field() {
        let err = CommandRequest::from_field(CommandKind::WorkflowRun, None).unwrap_err();
        assert_eq!(err.to_string(), "Missing 'script' field in request");

        let req = CommandRequest::from_field(CommandKind::AdHocRun, Some("ls".into())).unwrap();
        assert_eq!(req.kind(), CommandKind::AdHocRun);
        assert_eq!(req.payload(), "ls");
    }

    #[test]
    fn test_timeout_message() {
        let argv = vec!["sleep".to_string(), "60".to_string()];
        let err = RunOutcome::TimedOut
            .into_output(&argv, Duration::from_secs(30))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"Command '["sleep", "60"]' timed out after 30 seconds"#
        );
    }

    #[test]
    fn test_spawn_failure_names_program() {
        let argv = vec!["no-such-binary".to_string()];
        let err = RunOutcome::SpawnFailed("No such file or directory (os error 2)".into())
            .into_output(&argv, Duration::from_secs(30))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to spawn 'no-such-binary': No such file or directory (os error 2)"
        );
    }

    #[test]
    fn test_wait_failure_is_not_a_spawn_failure() {
        let argv = vec!["sh".to_string(), "-c".to_string(), "true".to_string()];
        let err = RunOutcome::WaitFailed("Interrupted system call (os error 4)".into())
            .into_output(&argv, Duration::from_secs(30))
            .unwrap_err();
        assert!(matches!(err, ExecutorError::WaitFailed(..)));
        assert_eq!(
            err.to_string(),
            "Failed to wait on 'sh': Interrupted system call (os error 4)"
        );
    }
}
