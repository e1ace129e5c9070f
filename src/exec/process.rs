//! Process-backed command runner
//!
//! Runs commands with `tokio::process`, inheriting the caller's environment.
//! No timeout is imposed; a hung tool hangs the run.

use super::{CommandRunner, Invocation, ToolOutput};
use crate::error::{NativepackError, NativepackResult};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tracing::debug;

/// Runs invocations as real child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    /// Create a new process runner
    pub fn new() -> Self {
        Self
    }

    fn command(invocation: &Invocation) -> Command {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(ref dir) = invocation.cwd {
            cmd.current_dir(dir);
        }
        for (key, value) in &invocation.env {
            cmd.env(key, value);
        }
        cmd
    }

    async fn run_captured(&self, invocation: &Invocation) -> NativepackResult<ToolOutput> {
        let output = Self::command(invocation)
            .output()
            .await
            .map_err(|e| NativepackError::command_failed(invocation.to_string(), e))?;

        Ok(ToolOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }

    async fn run_streamed(&self, invocation: &Invocation) -> NativepackResult<ToolOutput> {
        let mut child = Self::command(invocation)
            .spawn()
            .map_err(|e| NativepackError::command_failed(invocation.to_string(), e))?;

        let (stdout, stderr) = stream_child_output(&mut child).await;

        let status = child
            .wait()
            .await
            .map_err(|e| NativepackError::command_failed(invocation.to_string(), e))?;

        Ok(ToolOutput {
            code: status.code(),
            stdout: join_lines(&stdout),
            stderr: join_lines(&stderr),
        })
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, invocation: &Invocation) -> NativepackResult<ToolOutput> {
        debug!(command = %invocation, cwd = ?invocation.cwd, "Executing");
        if invocation.stream {
            self.run_streamed(invocation).await
        } else {
            self.run_captured(invocation).await
        }
    }
}

fn join_lines(lines: &[String]) -> String {
    let mut joined = lines.join("\n");
    if !joined.is_empty() {
        joined.push('\n');
    }
    joined
}

/// Echo stdout+stderr of a child process line by line while collecting both.
///
/// Lines are forwarded to the matching stream of this process so build logs
/// show up in CI output. Bytes that are not UTF-8 are replaced rather than
/// ending the read; both pipes are drained until EOF so the child never
/// blocks on a full pipe.
async fn stream_child_output(child: &mut Child) -> (Vec<String>, Vec<String>) {
    let mut stdout_lines = Vec::new();
    let mut stderr_lines = Vec::new();

    let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
        return (stdout_lines, stderr_lines);
    };

    let mut stdout_reader = BufReader::new(stdout);
    let mut stderr_reader = BufReader::new(stderr);
    let mut stdout_buf = Vec::new();
    let mut stderr_buf = Vec::new();

    let mut stdout_done = false;
    let mut stderr_done = false;

    while !stdout_done || !stderr_done {
        tokio::select! {
            read = stdout_reader.read_until(b'\n', &mut stdout_buf), if !stdout_done => {
                stdout_done = !forward_line(read, &mut stdout_buf, &mut stdout_lines, echo_stdout);
            }
            read = stderr_reader.read_until(b'\n', &mut stderr_buf), if !stderr_done => {
                stderr_done = !forward_line(read, &mut stderr_buf, &mut stderr_lines, echo_stderr);
            }
        }
    }

    (stdout_lines, stderr_lines)
}

fn echo_stdout(line: &str) {
    println!("{}", line);
}

fn echo_stderr(line: &str) {
    eprintln!("{}", line);
}

/// Forward whatever `buf` holds as one line; false once the stream has ended
fn forward_line(
    read: std::io::Result<usize>,
    buf: &mut Vec<u8>,
    lines: &mut Vec<String>,
    echo: fn(&str),
) -> bool {
    let more = match read {
        Ok(0) => false,
        Ok(_) => true,
        Err(e) => {
            debug!("Stopped reading tool output: {}", e);
            false
        }
    };
    if !buf.is_empty() {
        let line = decode_line(buf);
        echo(&line);
        lines.push(line);
        buf.clear();
    }
    more
}

fn decode_line(buf: &[u8]) -> String {
    let line = buf.strip_suffix(b"\n").unwrap_or(buf);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    String::from_utf8_lossy(line).into_owned()
}
