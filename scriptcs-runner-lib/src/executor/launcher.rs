use super::context::LogSink;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

/// Exit code reported for a child that ended without one (killed by a signal).
pub const NO_EXIT_CODE: i32 = -1;

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("no command to launch")]
    EmptyCommand,

    #[error("failed to start `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed while waiting for `{program}` to exit")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Everything needed to start the interpreter once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    pub argv: Vec<String>,
    pub env: HashMap<String, String>,
    pub cwd: PathBuf,
}

/// Starts a process, forwards its output to the sink and waits for it.
#[async_trait]
pub trait Launcher: Send + Sync {
    async fn launch(&self, request: &LaunchRequest, sink: &dyn LogSink) -> Result<i32, LaunchError>;
}

/// Launches real OS processes through `tokio::process`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessLauncher;

#[async_trait]
impl Launcher for ProcessLauncher {
    async fn launch(&self, request: &LaunchRequest, sink: &dyn LogSink) -> Result<i32, LaunchError> {
        let (program, args) = request.argv.split_first().ok_or(LaunchError::EmptyCommand)?;

        let mut child = Command::new(program)
            .args(args)
            .envs(&request.env)
            .current_dir(&request.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| LaunchError::Spawn {
                program: program.clone(),
                source,
            })?;

        tracing::info!(pid = ?child.id(), program = %program, "launched interpreter");

        if let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) {
            let mut stdout = BufReader::new(stdout);
            let mut stderr = BufReader::new(stderr);
            let (mut stdout_buf, mut stderr_buf) = (Vec::new(), Vec::new());
            let mut closed = (false, false);

            // Partial reads from a branch that lost the race stay in its buffer.
            while closed != (true, true) {
                let (read, is_stderr) = tokio::select! {
                    read = stdout.read_until(b'\n', &mut stdout_buf), if !closed.0 => (read, false),
                    read = stderr.read_until(b'\n', &mut stderr_buf), if !closed.1 => (read, true),
                };

                let buf = if is_stderr { &mut stderr_buf } else { &mut stdout_buf };
                let done = match read {
                    Ok(0) => true,
                    Ok(_) => false,
                    Err(e) => {
                        tracing::warn!("error reading interpreter output: {e}");
                        true
                    }
                };

                if !buf.is_empty() {
                    sink.line(&decode_line(buf));
                    buf.clear();
                }
                if done {
                    if is_stderr {
                        closed.1 = true;
                    } else {
                        closed.0 = true;
                    }
                }
            }
        }

        let status = child.wait().await.map_err(|source| LaunchError::Wait {
            program: program.clone(),
            source,
        })?;

        let code = status.code().unwrap_or(NO_EXIT_CODE);
        tracing::info!(exit_code = code, "interpreter exited");
        Ok(code)
    }
}

/// Decodes one line of output, dropping the line terminator.
///
/// Bytes that are not UTF-8 are replaced rather than ending the stream.
fn decode_line(buf: &[u8]) -> String {
    let line = buf.strip_suffix(b"\n").unwrap_or(buf);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    String::from_utf8_lossy(line).into_owned()
}
