// Process runner: spawn, capture, time-bound

use crate::executor::types::{CapturedOutput, RunOutcome};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

/// Default cap on captured bytes per stream (10 MiB)
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

/// Runs one external process to completion or timeout
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Execute `argv` directly (no shell) and wait at most `timeout`
    async fn run(&self, argv: &[String], timeout: Duration) -> RunOutcome;
}

/// Runner backed by `tokio::process`
#[derive(Debug, Clone)]
pub struct TokioProcessRunner {
    max_output_bytes: usize,
}

impl TokioProcessRunner {
    pub fn new(max_output_bytes: usize) -> Self {
        Self { max_output_bytes }
    }
}

impl Default for TokioProcessRunner {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_OUTPUT_BYTES)
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, argv: &[String], timeout: Duration) -> RunOutcome {
        let Some((program, args)) = argv.split_first() else {
            return RunOutcome::SpawnFailed("empty command".to_string());
        };

        let start = Instant::now();

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Own process group so the whole tree can be killed on timeout
        #[cfg(unix)]
        cmd.process_group(0);

        debug!(program = %program, args = ?args, timeout_secs = timeout.as_secs(), "spawning process");

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(program = %program, error = %e, "failed to spawn process");
                return RunOutcome::SpawnFailed(e.to_string());
            }
        };

        // Taken before any wait: once the child is reaped id() is gone, but
        // its group may still hold backgrounded grandchildren.
        let pgid = child.id();

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let cap = self.max_output_bytes;

        // Pipes must drain while waiting. A grandchild holding a pipe open
        // keeps this pending until the deadline.
        let collected = tokio::time::timeout(timeout, async {
            tokio::join!(
                child.wait(),
                read_stream(stdout, cap),
                read_stream(stderr, cap)
            )
        })
        .await;

        match collected {
            Ok((Ok(status), stdout, stderr)) => {
                let output = CapturedOutput {
                    exited_normally: status.success(),
                    exit_code: status.code(),
                    stdout: String::from_utf8_lossy(&stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&stderr).into_owned(),
                };

                info!(
                    program = %program,
                    duration_ms = start.elapsed().as_millis() as u64,
                    exit_code = status.code().unwrap_or(-1),
                    stdout_bytes = output.stdout.len(),
                    stderr_bytes = output.stderr.len(),
                    "process finished"
                );

                RunOutcome::Completed(output)
            }
            Ok((Err(e), _, _)) => {
                warn!(program = %program, error = %e, "failed to wait on process");
                terminate(&mut child, pgid).await;
                RunOutcome::WaitFailed(e.to_string())
            }
            Err(_elapsed) => {
                warn!(
                    program = %program,
                    timeout_secs = timeout.as_secs(),
                    "process timed out, killing"
                );
                terminate(&mut child, pgid).await;
                RunOutcome::TimedOut
            }
        }
    }
}

/// Kill the child and its process group, then reap it
async fn terminate(child: &mut Child, pgid: Option<u32>) {
    kill_group(pgid);

    if let Err(e) = child.kill().await {
        debug!(error = %e, "kill after timeout failed");
    }
}

/// The child was spawned with process_group(0), so its pid is the pgid
#[cfg(unix)]
fn kill_group(pgid: Option<u32>) {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    if let Some(pgid) = pgid
        && let Err(e) = killpg(Pid::from_raw(pgid as i32), Signal::SIGKILL)
    {
        debug!(pgid, error = %e, "killpg failed");
    }
}

#[cfg(not(unix))]
fn kill_group(_pgid: Option<u32>) {}

/// Read a whole stream, keeping at most `cap` bytes and draining the rest
async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>, cap: usize) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut h) = handle {
        if let Err(e) = (&mut h).take(cap as u64).read_to_end(&mut buf).await {
            warn!(error = %e, captured_bytes = buf.len(), "failed to read process output");
            return buf;
        }
        if let Err(e) = tokio::io::copy(&mut h, &mut tokio::io::sink()).await {
            debug!(error = %e, "failed to drain output beyond cap");
        }
    }
    buf
}
