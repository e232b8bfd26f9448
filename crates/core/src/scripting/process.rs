//! Local process runner.
//!
//! Spawns the first command token directly (no extra shell) with the rest
//! as its arguments.

use tokio::process::Command;

use crate::error::CoreError;

use super::context::RunLogger;
use super::executor::{RunnerOutput, ScriptError, ScriptRequest, ScriptRunner};
use super::subprocess;

/// Runs scripts as child processes of the current host.
pub struct ProcessRunner;

impl ScriptRunner for ProcessRunner {
    async fn run(
        &self,
        request: ScriptRequest,
        logger: &RunLogger,
    ) -> Result<RunnerOutput, ScriptError> {
        let mut cmd = {
            let (program, args) = request
                .command
                .split_first()
                .ok_or_else(|| CoreError::Validation("Command line is empty".to_string()))?;
            let mut cmd = Command::new(program);
            cmd.args(args);
            cmd
        };
        subprocess::run_command(&mut cmd, request, logger).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
