//! Shared subprocess management utilities.
//!
//! Provides [`run_command`], the spawn + stream + timeout logic used by both
//! runners. Each runner builds a [`tokio::process::Command`] for its target
//! (the interpreter itself, or the docker client) and delegates here.

use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Instant;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinError;

use super::context::RunLogger;
use super::executor::{RunnerOutput, ScriptError, ScriptRequest};
use super::log_consumer::{StreamKind, StreamSummary};

/// Spawn `cmd`, stream stdout/stderr line by line to `logger`, and enforce
/// the request timeout.
///
/// The caller sets program and arguments. Environment variables and the
/// working directory from [`ScriptRequest`] are applied here. The timeout
/// bounds both the wait for the child and the draining of its output. On
/// expiry the child is dropped, which kills it (`kill_on_drop`).
pub async fn run_command(
    cmd: &mut Command,
    request: ScriptRequest,
    logger: &RunLogger,
) -> Result<RunnerOutput, ScriptError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .current_dir(&request.working_directory);

    for (key, value) in &request.env_vars {
        cmd.env(key, value);
    }

    let program = cmd.as_std().get_program().to_string_lossy().into_owned();
    let start = Instant::now();
    let deadline = tokio::time::Instant::now() + request.timeout;

    let mut child = cmd.spawn().map_err(|e| match e.kind() {
        ErrorKind::NotFound => ScriptError::NotFound(program.clone()),
        _ => ScriptError::IoError(e),
    })?;

    tracing::debug!(program = %program, pid = ?child.id(), "Spawned script process");

    let mut stdout_task = tokio::spawn(consume_stream(
        child.stdout.take(),
        StreamKind::StdOut,
        logger.clone(),
    ));
    let mut stderr_task = tokio::spawn(consume_stream(
        child.stderr.take(),
        StreamKind::StdErr,
        logger.clone(),
    ));

    let status = match tokio::time::timeout_at(deadline, child.wait()).await {
        Ok(Ok(status)) => status,
        Ok(Err(e)) => {
            stdout_task.abort();
            stderr_task.abort();
            return Err(ScriptError::IoError(e));
        }
        Err(_elapsed) => {
            stdout_task.abort();
            stderr_task.abort();
            let elapsed_ms = start.elapsed().as_millis() as u64;
            tracing::warn!(program = %program, elapsed_ms, "Script timed out, killing process");
            return Err(ScriptError::Timeout { elapsed_ms });
        }
    };

    // Background processes inherit the pipes and can keep them open after
    // the script itself exited; the deadline covers draining them too.
    let drained = tokio::time::timeout_at(deadline, async {
        tokio::join!(&mut stdout_task, &mut stderr_task)
    })
    .await;

    let (stdout, stderr) = match drained {
        Ok((stdout, stderr)) => (
            reader_summary(stdout, StreamKind::StdOut)?,
            reader_summary(stderr, StreamKind::StdErr)?,
        ),
        Err(_elapsed) => {
            stdout_task.abort();
            stderr_task.abort();
            let elapsed_ms = start.elapsed().as_millis() as u64;
            tracing::warn!(
                program = %program,
                elapsed_ms,
                "Script exited but its output streams stayed open past the timeout",
            );
            logger.warn("Output streams still held open by a background process at timeout");
            return Err(ScriptError::Timeout { elapsed_ms });
        }
    };

    let mut vars = stdout.vars;
    vars.extend(stderr.vars);

    Ok(RunnerOutput {
        exit_code: status.code().unwrap_or(-1),
        std_out_line_count: stdout.line_count,
        std_err_line_count: stderr.line_count,
        vars,
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

fn reader_summary(
    joined: Result<StreamSummary, JoinError>,
    stream: StreamKind,
) -> Result<StreamSummary, ScriptError> {
    joined.map_err(|e| {
        tracing::warn!(error = %e, ?stream, "Output reader task failed");
        ScriptError::IoError(std::io::Error::other(format!(
            "reading {stream:?} failed: {e}"
        )))
    })
}

/// Read `handle` to the end, feeding each line to a [`StreamSummary`].
///
/// Invalid UTF-8 is replaced rather than aborting the stream.
async fn consume_stream<R: AsyncRead + Unpin>(
    handle: Option<R>,
    stream: StreamKind,
    logger: RunLogger,
) -> StreamSummary {
    let mut summary = StreamSummary::default();
    let Some(handle) = handle else {
        return summary;
    };

    let mut reader = BufReader::new(handle);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(['\n', '\r']);
                summary.accept(line, stream, &logger);
            }
            Err(e) => {
                tracing::warn!(error = %e, ?stream, "Failed reading script output");
                break;
            }
        }
    }
    summary
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
