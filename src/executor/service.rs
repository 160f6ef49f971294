// Execution service: the three operations the HTTP layer calls

use crate::executor::config::ExecutorConfig;
use crate::executor::error::{ExecutorError, Result};
use crate::executor::policy::{Whitelist, tokenize};
use crate::executor::resolver::{Resolution, WorkflowResolver};
use crate::executor::runner::{ProcessRunner, TokioProcessRunner};
use crate::executor::types::{CapturedOutput, CommandKind, CommandRequest, ExecutionResult};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Composes resolver, policy and runner into uniform results.
///
/// Stateless between calls; cheap to share behind an `Arc`.
pub struct ExecutionService {
    runner: Arc<dyn ProcessRunner>,
    resolver: WorkflowResolver,
    ad_hoc_rule: Whitelist,
    shell: String,
}

impl ExecutionService {
    pub fn new(
        runner: Arc<dyn ProcessRunner>,
        resolver: WorkflowResolver,
        ad_hoc_rule: Whitelist,
        shell: impl Into<String>,
    ) -> Self {
        Self {
            runner,
            resolver,
            ad_hoc_rule,
            shell: shell.into(),
        }
    }

    /// Build the production service from configuration
    pub fn from_config(config: &ExecutorConfig) -> Self {
        info!(
            workflows_dir = %config.workflows_dir.display(),
            shell = %config.shell,
            allow_ad_hoc_commands = config.allow_ad_hoc_commands,
            contain_workflows = config.contain_workflows,
            "initializing execution service"
        );

        Self::new(
            Arc::new(TokioProcessRunner::new(config.max_output_bytes)),
            WorkflowResolver::new(&config.workflows_dir, config.contain_workflows),
            Whitelist::ad_hoc(config.allow_ad_hoc_commands),
            &config.shell,
        )
    }

    /// Dispatch a request to the matching operation
    pub async fn execute(&self, request: &CommandRequest) -> ExecutionResult {
        debug!(kind = ?request.kind(), "dispatching request");
        match request.kind() {
            CommandKind::WorkflowRun => self.run_workflow(request.payload()).await,
            CommandKind::ToolInstall => self.install_tool(request.payload()).await,
            CommandKind::AdHocRun => self.run_command(request.payload()).await,
        }
    }

    /// Run a script from the workflows directory with the shell interpreter
    pub async fn run_workflow(&self, script_name: &str) -> ExecutionResult {
        finish("run-workflow", self.try_run_workflow(script_name).await)
    }

    /// Run a `sudo apt install` command line
    pub async fn install_tool(&self, command_line: &str) -> ExecutionResult {
        finish("install-tool", self.try_install_tool(command_line).await)
    }

    /// Run an ad-hoc command line with the short budget
    pub async fn run_command(&self, command_line: &str) -> ExecutionResult {
        finish("run-command", self.try_run_command(command_line).await)
    }

    async fn try_run_workflow(&self, script_name: &str) -> Result<String> {
        let path = match self.resolver.resolve(script_name).await {
            Resolution::Found(path) => path,
            Resolution::NotFound(path) => {
                info!(script = %script_name, path = %path.display(), "workflow script not found");
                return Ok(format!(
                    "Workflow script not found: {script_name}\n\nCreate it at: {}",
                    path.display()
                ));
            }
            Resolution::Escapes(path) => {
                warn!(script = %script_name, path = %path.display(), "rejected workflow outside directory");
                return Err(ExecutorError::OutsideWorkflowsDir(script_name.to_string()));
            }
        };

        let argv = vec![self.shell.clone(), path.to_string_lossy().into_owned()];
        let timeout = CommandKind::WorkflowRun.timeout();
        let output = self.run(&argv, timeout).await?;

        let mut message = format!("Workflow completed!\n\nOutput:\n{}", output.stdout);
        if !output.stderr.is_empty() {
            message.push_str("\n\nErrors:\n");
            message.push_str(&output.stderr);
        }
        Ok(message)
    }

    async fn try_install_tool(&self, command_line: &str) -> Result<String> {
        Whitelist::InstallWhitelist.validate(command_line)?;

        let argv = tokenize(command_line);
        let timeout = CommandKind::ToolInstall.timeout();
        let output = self.run(&argv, timeout).await?;

        // stderr is not reported on this path
        Ok(format!("Installation started!\n\n{}", output.stdout))
    }

    async fn try_run_command(&self, command_line: &str) -> Result<String> {
        self.ad_hoc_rule.validate(command_line)?;

        let argv = tokenize(command_line);
        if argv.is_empty() {
            return Err(ExecutorError::EmptyCommand);
        }

        let timeout = CommandKind::AdHocRun.timeout();
        let output = self.run(&argv, timeout).await?;

        let mut message = format!("Command executed!\n\n{}", output.stdout);
        if !output.stderr.is_empty() {
            message.push_str("\n\n");
            message.push_str(&output.stderr);
        }
        Ok(message)
    }

    async fn run(&self, argv: &[String], timeout: Duration) -> Result<CapturedOutput> {
        let output = self.runner.run(argv, timeout).await.into_output(argv, timeout)?;
        if !output.exited_normally {
            debug!(argv = ?argv, exit_code = ?output.exit_code, "process exited unsuccessfully");
        }
        Ok(output)
    }
}

fn finish(operation: &str, result: Result<String>) -> ExecutionResult {
    if let Err(e) = &result {
        warn!(operation, error = %e, "operation failed");
    }
    result.into()
}
