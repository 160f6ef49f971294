// Executor configuration

use crate::executor::runner::DEFAULT_MAX_OUTPUT_BYTES;
use serde::Deserialize;
use std::path::PathBuf;

/// Executor configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Trusted directory holding workflow scripts
    pub workflows_dir: PathBuf,
    /// Interpreter workflow scripts are run with
    pub shell: String,
    /// Whether `run-command` accepts arbitrary command lines
    pub allow_ad_hoc_commands: bool,
    /// Reject workflow names that leave `workflows_dir`
    pub contain_workflows: bool,
    /// Cap on captured bytes per output stream
    pub max_output_bytes: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            workflows_dir: PathBuf::from("workflows"),
            shell: String::from("bash"),
            allow_ad_hoc_commands: true,
            contain_workflows: true,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }
}
