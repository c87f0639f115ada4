//! Running the chalk binary inside a validated project.
//!
//! stdout and stderr are drained concurrently into one buffer, in the order
//! chunks arrive, so the caller sees the same interleaving a terminal would.

use std::ffi::OsString;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use super::error::ToolError;
use super::operation::Operation;
use super::project::ProjectPath;

const READ_CHUNK: usize = 8 * 1024;

/// Combined output of a chalk run that exited successfully.
#[derive(Debug, Clone)]
pub struct InvocationResult {
    pub output: Vec<u8>,
    pub status: ExitStatus,
}

impl InvocationResult {
    /// Output as text. Invalid UTF-8 sequences are replaced, valid output is
    /// returned byte-for-byte.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

/// How to launch chalk: resolved once from settings, shared by every request.
#[derive(Debug, Clone)]
pub struct ChalkCommand {
    program: String,
    base_args: Vec<String>,
    env_override: Option<(String, OsString)>,
    timeout: Option<Duration>,
}

impl ChalkCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            base_args: Vec::new(),
            env_override: None,
            timeout: None,
        }
    }

    /// Arguments placed before the operation's own arguments.
    pub fn with_base_args(mut self, args: Vec<String>) -> Self {
        self.base_args = args;
        self
    }

    /// Environment variable set on top of the inherited environment.
    pub fn with_env_override(mut self, key: impl Into<String>, value: impl Into<OsString>) -> Self {
        self.env_override = Some((key.into(), value.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Full argument list for `op`.
    pub fn args_for(&self, op: Operation) -> Vec<String> {
        self.base_args
            .iter()
            .cloned()
            .chain(op.args().iter().map(|a| a.to_string()))
            .collect()
    }

    /// Run chalk for `op` in `project` and wait for it to exit.
    pub async fn invoke(
        &self,
        project: &ProjectPath,
        op: Operation,
    ) -> Result<InvocationResult, ToolError> {
        let args = self.args_for(op);
        let mut cmd = Command::new(&self.program);
        cmd.args(&args)
            .current_dir(project.as_path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some((key, value)) = &self.env_override {
            cmd.env(key, value);
        }

        debug!(program = %self.program, ?args, project = %project, "launching chalk");
        let started = Instant::now();

        let mut child = cmd.spawn().map_err(|e| {
            warn!(program = %self.program, error = %e, "failed to start chalk");
            ToolError::tool_failure(e.to_string(), Vec::new())
        })?;

        let mut output = Vec::new();
        let status = match self.timeout {
            None => wait_collecting(&mut child, &mut output).await,
            Some(limit) => {
                match tokio::time::timeout(limit, wait_collecting(&mut child, &mut output)).await
                {
                    Ok(res) => res,
                    Err(_) => {
                        let _ = child.start_kill();
                        warn!(project = %project, %op, ?limit, "chalk timed out");
                        return Err(ToolError::tool_failure(
                            format!("timed out after {}s", limit.as_secs_f64()),
                            output,
                        ));
                    }
                }
            }
        };

        let status = match status {
            Ok(s) => s,
            Err(e) => return Err(ToolError::tool_failure(e.to_string(), output)),
        };

        debug!(
            project = %project,
            %op,
            %status,
            bytes = output.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "chalk exited"
        );

        if status.success() {
            Ok(InvocationResult { output, status })
        } else {
            warn!(project = %project, %op, %status, "chalk exited with failure");
            Err(ToolError::tool_failure(status.to_string(), output))
        }
    }
}

/// Drain both pipes into `output` until they close, then reap the child.
async fn wait_collecting(child: &mut Child, output: &mut Vec<u8>) -> std::io::Result<ExitStatus> {
    let mut stdout = child.stdout.take();
    let mut stderr = child.stderr.take();
    let mut out_buf = [0u8; READ_CHUNK];
    let mut err_buf = [0u8; READ_CHUNK];

    loop {
        tokio::select! {
            n = read_some(&mut stdout, &mut out_buf), if stdout.is_some() => {
                match n? {
                    0 => stdout = None,
                    n => output.extend_from_slice(&out_buf[..n]),
                }
            }
            n = read_some(&mut stderr, &mut err_buf), if stderr.is_some() => {
                match n? {
                    0 => stderr = None,
                    n => output.extend_from_slice(&err_buf[..n]),
                }
            }
            else => break,
        }
    }

    child.wait().await
}

async fn read_some<R>(pipe: &mut Option<R>, buf: &mut [u8]) -> std::io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    match pipe {
        Some(p) => p.read(buf).await,
        None => Ok(0),
    }
}
