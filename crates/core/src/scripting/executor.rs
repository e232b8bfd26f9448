//! Unified script runner interface and shared types.
//!
//! Defines [`ScriptRunner`], the trait the process and docker runners
//! implement, along with [`ScriptRequest`], [`RunnerOutput`],
//! [`ScriptOutput`] and [`ScriptError`].

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;

use super::context::RunLogger;

/// What a runner executes.
#[derive(Debug, Clone)]
pub struct ScriptRequest {
    /// Program followed by its arguments (interpreter tokens + script body).
    pub command: Vec<String>,
    /// Additional environment variables set for the script.
    pub env_vars: Vec<(String, String)>,
    /// Directory the script runs in; input files are already there.
    pub working_directory: PathBuf,
    /// Maximum wall-clock time before the process is killed.
    pub timeout: Duration,
}

/// What a runner observed while the script ran.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunnerOutput {
    /// Process exit code (`-1` if killed by signal).
    pub exit_code: i32,
    pub std_out_line_count: u64,
    pub std_err_line_count: u64,
    /// Output variables announced by the script on `::{...}::` lines.
    pub vars: Map<String, Value>,
    pub duration_ms: u64,
}

/// Result of one script task run, as returned to the host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScriptOutput {
    pub exit_code: i32,
    pub std_out_line_count: u64,
    pub std_err_line_count: u64,
    pub vars: Map<String, Value>,
    /// Collected output files, keyed by path relative to the working directory.
    pub output_files: BTreeMap<String, PathBuf>,
    pub duration_ms: u64,
    /// Set when `warningOnStdErr` is on and the script wrote to stderr.
    pub warning: bool,
}

impl ScriptOutput {
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Infrastructure failures. A non-zero exit code is not one of them.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error(transparent)]
    Invalid(#[from] CoreError),

    #[error("Executable not found: {0}")]
    NotFound(String),

    #[error("Script timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    #[error("Container failed to start (docker exit code {exit_code}): {message}")]
    ContainerFailed { exit_code: i32, message: String },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Trait implemented by every runner (local process, docker).
///
/// A runner spawns `request.command`, streams each output line to `logger`
/// and returns once the process exited and both streams are drained.
pub trait ScriptRunner: Send + Sync {
    fn run(
        &self,
        request: ScriptRequest,
        logger: &RunLogger,
    ) -> impl std::future::Future<Output = Result<RunnerOutput, ScriptError>> + Send;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
