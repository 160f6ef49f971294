use crate::comm::error::CommError;
use crate::executor::{CommandKind, CommandRequest, ExecutorError};
use serde::Deserialize;

/// Body of `POST /api/run-workflow`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkflowBody {
    pub script: Option<String>,
}

/// Body of `POST /api/install-tool` and `POST /api/run-command`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommandBody {
    pub command: Option<String>,
}

impl WorkflowBody {
    pub fn into_request(self) -> Result<CommandRequest, ExecutorError> {
        CommandRequest::from_field(CommandKind::WorkflowRun, self.script)
    }
}

impl CommandBody {
    pub fn into_request(self, kind: CommandKind) -> Result<CommandRequest, ExecutorError> {
        CommandRequest::from_field(kind, self.command)
    }
}

/// Parse a JSON object body, ignoring `Content-Type`
pub fn parse_body<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> Result<T, CommError> {
    serde_json::from_slice(bytes).map_err(|e| CommError::BadRequest(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_workflow_body() {
        let body: WorkflowBody = parse_body(br#"{"script": "focus.sh"}"#).unwrap();
        let req = body.into_request().unwrap();
        assert_eq!(req.kind(), CommandKind::WorkflowRun);
        assert_eq!(req.payload(), "focus.sh");
    }

    #[test]
    fn test_missing_field_is_not_a_parse_error() {
        let body: CommandBody = parse_body(br#"{"other": 1}"#).unwrap();
        let err = body.into_request(CommandKind::AdHocRun).unwrap_err();
        assert_eq!(err.to_string(), "Missing 'command' field in request");
    }

    #[test]
    fn test_invalid_json() {
        let result: Result<CommandBody, _> = parse_body(b"not json");
        assert!(matches!(result, Err(CommError::BadRequest(_))));

        let result: Result<CommandBody, _> = parse_body(b"[1, 2]");
        assert!(matches!(result, Err(CommError::BadRequest(_))));
    }
}
