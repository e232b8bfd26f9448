//! Docker runner.
//!
//! Wraps the assembled command in `docker run`, mounting the working
//! directory at [`CONTAINER_WORKING_DIR`]. The docker client's own output is
//! the container's output, so the shared subprocess logic applies unchanged.

use std::path::Path;

use tokio::process::Command;

use crate::error::CoreError;

use super::context::RunLogger;
use super::docker::DockerOptions;
use super::executor::{RunnerOutput, ScriptError, ScriptRequest, ScriptRunner};
use super::subprocess;

/// Mount point of the working directory inside the container.
pub const CONTAINER_WORKING_DIR: &str = "/app";

/// `docker run` exits with 125 when the daemon could not create or start
/// the container (bad image, pull failure, invalid flags).
pub const DOCKER_RUN_FAILURE: i32 = 125;

pub struct DockerRunner {
    docker_binary: String,
    options: DockerOptions,
    container_name: String,
}

impl DockerRunner {
    pub fn new(
        docker_binary: impl Into<String>,
        options: DockerOptions,
        container_name: impl Into<String>,
    ) -> Self {
        Self {
            docker_binary: docker_binary.into(),
            options,
            container_name: container_name.into(),
        }
    }

    pub fn options(&self) -> &DockerOptions {
        &self.options
    }

    /// Arguments passed to the docker client for `request`.
    ///
    /// Environment values are not placed on the command line: `-e KEY`
    /// makes docker read them from the client's environment.
    pub fn docker_args(
        &self,
        host_dir: &Path,
        request: &ScriptRequest,
    ) -> Result<Vec<String>, CoreError> {
        let image = self
            .options
            .image
            .as_deref()
            .filter(|i| !i.trim().is_empty())
            .ok_or_else(|| CoreError::Validation("Docker runner requires an image".to_string()))?;

        let mut args: Vec<String> = vec![
            "run".into(),
            "--rm".into(),
            "--name".into(),
            self.container_name.clone(),
            "--pull".into(),
            self.options.pull_policy.as_docker_flag().into(),
            "-v".into(),
            format!("{}:{CONTAINER_WORKING_DIR}", host_dir.display()),
            "-w".into(),
            CONTAINER_WORKING_DIR.into(),
        ];

        for (key, _) in &request.env_vars {
            args.push("-e".into());
            args.push(key.clone());
        }

        let flags = [
            ("--user", &self.options.user),
            ("--network", &self.options.network_mode),
            ("--cpus", &self.options.cpus),
            ("--memory", &self.options.memory),
        ];
        for (flag, value) in flags {
            if let Some(value) = value {
                args.push(flag.into());
                args.push(value.clone());
            }
        }

        if let Some(entrypoint) = &self.options.entrypoint {
            args.push(format!("--entrypoint={entrypoint}"));
        }

        args.push(image.to_string());
        args.extend(request.command.iter().cloned());
        Ok(args)
    }

    /// Force-remove the container; used after a timeout killed the client.
    async fn remove_container(&self) {
        let result = Command::new(&self.docker_binary)
            .args(["rm", "-f", self.container_name.as_str()])
            .kill_on_drop(true)
            .output()
            .await;
        match result {
            Ok(out) if out.status.success() => {
                tracing::debug!(container = %self.container_name, "Removed timed-out container");
            }
            Ok(out) => tracing::warn!(
                container = %self.container_name,
                stderr = %String::from_utf8_lossy(&out.stderr).trim(),
                "Failed to remove timed-out container",
            ),
            Err(e) => tracing::warn!(
                container = %self.container_name,
                error = %e,
                "Failed to remove timed-out container",
            ),
        }
    }
}

impl ScriptRunner for DockerRunner {
    async fn run(
        &self,
        request: ScriptRequest,
        logger: &RunLogger,
    ) -> Result<RunnerOutput, ScriptError> {
        let host_dir = tokio::fs::canonicalize(&request.working_directory).await?;
        let args = self.docker_args(&host_dir, &request)?;

        tracing::debug!(
            container = %self.container_name,
            image = ?self.options.image,
            "Starting container",
        );

        let mut cmd = Command::new(&self.docker_binary);
        cmd.args(&args);

        match subprocess::run_command(&mut cmd, request, logger).await {
            Ok(output) if output.exit_code == DOCKER_RUN_FAILURE => {
                Err(ScriptError::ContainerFailed {
                    exit_code: output.exit_code,
                    message: format!(
                        "docker could not run image '{}'",
                        self.options.image.as_deref().unwrap_or_default()
                    ),
                })
            }
            Err(err @ ScriptError::Timeout { .. }) => {
                self.remove_container().await;
                Err(err)
            }
            other => other,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
