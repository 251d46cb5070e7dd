//! Helpers for running child processes with timeouts and bounded output.

use std::io::Read;
use std::os::unix::process::CommandExt;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use nix::sys::signal::{Signal, killpg};
use nix::unistd::Pid;
use tracing::{debug, error, instrument, warn};
use wait_timeout::ChildExt;

pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_OUTPUT_LIMIT_BYTES: usize = 64_000 - 512;
/// Extra time allowed for the reader to hand over output once the child is gone.
const DRAIN_GRACE: Duration = Duration::from_secs(1);

/// Captured child process output.
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stdout_truncated: usize,
    pub timed_out: bool,
}

type ReadResult = Result<(Vec<u8>, usize)>;

/// Run a command with a hard deadline, capturing at most `output_limit_bytes` of stdout.
///
/// The child leads its own process group so a timeout can kill everything it
/// started. stdin is closed and stderr goes to the parent's stderr. Output is
/// read on a helper thread while the child runs; bytes beyond the limit are
/// drained and counted but not stored.
///
/// The call returns within `timeout` plus a short drain grace period even
/// when descendants keep the output pipe open after the child exits.
#[instrument(
    skip_all,
    fields(timeout_secs = timeout.as_secs(), output_limit_bytes = output_limit_bytes)
)]
pub fn run_bounded(
    mut cmd: Command,
    timeout: Duration,
    output_limit_bytes: usize,
) -> Result<CommandOutput> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .process_group(0);

    let deadline = Instant::now() + timeout;
    debug!("spawning child process");
    let mut child = match cmd.spawn() {
        Ok(c) => c,
        Err(e) => {
            error!(err = %e, "failed to spawn command");
            return Err(e).context("spawn command");
        }
    };

    let stdout = match child.stdout.take() {
        Some(stdout) => stdout,
        None => {
            kill_process_group(&mut child);
            return Err(anyhow!("stdout was not piped"));
        }
    };

    let (tx, rx) = mpsc::channel::<ReadResult>();
    thread::spawn(move || {
        // The receiver may already be gone after a timeout.
        let _ = tx.send(read_stream_limited(stdout, output_limit_bytes));
    });

    let waited = match child.wait_timeout(timeout) {
        Ok(waited) => waited,
        Err(e) => {
            kill_process_group(&mut child);
            return Err(e).context("wait for command");
        }
    };

    match waited {
        Some(status) => {
            let budget = deadline.saturating_duration_since(Instant::now()) + DRAIN_GRACE;
            match rx.recv_timeout(budget) {
                Ok(read) => {
                    let (stdout, stdout_truncated) = read.context("read stdout")?;
                    if stdout_truncated > 0 {
                        warn!(stdout_truncated, "output truncated");
                    }
                    debug!(exit_code = ?status.code(), "command finished");
                    Ok(CommandOutput {
                        status,
                        stdout,
                        stdout_truncated,
                        timed_out: false,
                    })
                }
                Err(RecvTimeoutError::Timeout) => {
                    warn!("child exited but its output stayed open, killing group");
                    kill_process_group(&mut child);
                    Ok(CommandOutput {
                        status,
                        stdout: Vec::new(),
                        stdout_truncated: 0,
                        timed_out: true,
                    })
                }
                Err(RecvTimeoutError::Disconnected) => {
                    Err(anyhow!("output reader thread panicked"))
                }
            }
        }
        None => {
            warn!(timeout_secs = timeout.as_secs(), "command timed out, killing");
            kill_process_group(&mut child);
            let status = child.wait().context("wait command after kill")?;
            // Best effort: partial output is not guaranteed after a kill.
            let (stdout, stdout_truncated) = match rx.recv_timeout(DRAIN_GRACE) {
                Ok(Ok(read)) => read,
                _ => (Vec::new(), 0),
            };
            debug!(exit_code = ?status.code(), "timed out command reaped");
            Ok(CommandOutput {
                status,
                stdout,
                stdout_truncated,
                timed_out: true,
            })
        }
    }
}

/// SIGKILL the child's process group, falling back to the child alone.
fn kill_process_group(child: &mut Child) {
    let killed_group = i32::try_from(child.id())
        .map_err(|e| e.to_string())
        .and_then(|pid| killpg(Pid::from_raw(pid), Signal::SIGKILL).map_err(|e| e.to_string()));
    if let Err(err) = killed_group {
        debug!(err = %err, "process group kill failed, killing child");
        if let Err(e) = child.kill() {
            warn!(err = %e, "failed to kill child");
        }
    }
}

fn read_stream_limited<R: Read>(mut reader: R, limit: usize) -> ReadResult {
    let mut buf = Vec::new();
    let mut truncated = 0usize;
    let mut chunk = [0u8; 8192];

    loop {
        let n = reader.read(&mut chunk).context("read output")?;
        if n == 0 {
            break;
        }
        let remaining = limit.saturating_sub(buf.len());
        if remaining > 0 {
            let keep = n.min(remaining);
            buf.extend_from_slice(&chunk[..keep]);
            truncated += n.saturating_sub(keep);
        } else {
            truncated += n;
        }
    }

    Ok((buf, truncated))
}
