//! Script task descriptor: the configuration of one task invocation and the
//! `run` operation every task kind shares.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::fs;

use crate::error::CoreError;
use crate::types::TaskId;

use super::commands::{script_commands, TargetOs};
use super::container::{DockerRunner, CONTAINER_WORKING_DIR};
use super::context::RunContext;
use super::docker::DockerOptions;
use super::executor::{ScriptError, ScriptOutput, ScriptRequest, ScriptRunner};
use super::files::{validate_relative_path, write_input_files, OutputMatcher};
use super::kind::TaskKind;
use super::process::ProcessRunner;
use super::render;

/// Where the assembled command runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunnerKind {
    #[default]
    Process,
    Docker,
}

impl RunnerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Process => "PROCESS",
            Self::Docker => "DOCKER",
        }
    }
}

impl fmt::Display for RunnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_true() -> bool {
    true
}

/// One script task invocation.
///
/// Deserialized from a JSON task definition ([`ScriptTask::from_json`]) or
/// built with [`ScriptTask::builder`]. Both paths validate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ScriptTask {
    pub id: TaskId,

    #[serde(rename = "type")]
    pub kind: TaskKind,

    pub commands: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub before_commands: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpreter: Option<Vec<String>>,

    #[serde(default)]
    pub target_os: TargetOs,

    /// Prepend the OS exit-on-error command to the script.
    #[serde(default = "default_true")]
    pub fail_fast: bool,

    /// Image for the docker runner when `docker.image` is unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_image: Option<String>,

    #[serde(default)]
    pub docker: DockerOptions,

    #[serde(default)]
    pub task_runner: RunnerKind,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,

    /// File name (relative to the working directory) to content.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub input_files: BTreeMap<String, String>,

    /// Glob patterns collected after the run.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output_files: Vec<String>,

    /// Maximum run time in seconds.
    #[serde(default, rename = "timeout", skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    #[serde(default = "default_true")]
    pub warning_on_std_err: bool,
}

impl ScriptTask {
    pub fn builder(kind: TaskKind, id: impl Into<TaskId>) -> ScriptTaskBuilder {
        ScriptTaskBuilder {
            task: ScriptTask {
                id: id.into(),
                kind,
                commands: Vec::new(),
                before_commands: Vec::new(),
                interpreter: None,
                target_os: TargetOs::default(),
                fail_fast: true,
                container_image: None,
                docker: DockerOptions::default(),
                task_runner: RunnerKind::default(),
                env: BTreeMap::new(),
                input_files: BTreeMap::new(),
                output_files: Vec::new(),
                timeout_secs: None,
                warning_on_std_err: true,
            },
        }
    }

    /// Parse and validate a JSON task definition.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let task: ScriptTask = serde_json::from_str(json)?;
        task.validate()?;
        Ok(task)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        validate_id(&self.id)?;

        if self.commands.is_empty() {
            return Err(CoreError::Validation(format!(
                "Task '{}' must define at least one command",
                self.id
            )));
        }
        if self.interpreter.as_ref().is_some_and(|i| i.is_empty()) {
            return Err(CoreError::Validation(format!(
                "Task '{}' has an empty interpreter",
                self.id
            )));
        }
        if self
            .container_image
            .as_ref()
            .is_some_and(|i| i.trim().is_empty())
        {
            return Err(CoreError::Validation(format!(
                "Task '{}' has a blank containerImage",
                self.id
            )));
        }
        if self.timeout_secs == Some(0) {
            return Err(CoreError::Validation(format!(
                "Task '{}' timeout must be positive",
                self.id
            )));
        }
        for name in self.input_files.keys() {
            validate_relative_path(name)?;
        }
        for pattern in &self.output_files {
            validate_relative_path(pattern)?;
        }
        for key in self.env.keys() {
            if key.is_empty() || key.contains('=') || key.contains('\0') {
                return Err(CoreError::Validation(format!(
                    "Invalid environment variable name '{key}'"
                )));
            }
        }
        Ok(())
    }

    /// Image the docker runner uses when `docker.image` is unset.
    pub fn container_image(&self) -> &str {
        self.container_image
            .as_deref()
            .unwrap_or_else(|| self.kind.default_image())
    }

    /// `options` with the image filled in when absent. An explicit image is
    /// never replaced.
    pub fn inject_defaults(&self, options: &DockerOptions) -> DockerOptions {
        let mut options = options.clone();
        if options.image.is_none() {
            options.image = Some(self.container_image().to_string());
        }
        options
    }

    /// `beforeCommands`, prefixed with the exit-on-error command when
    /// `failFast` is set.
    pub fn before_commands_with_options(&self) -> Vec<String> {
        let mut commands = Vec::with_capacity(self.before_commands.len() + 1);
        if self.fail_fast {
            commands.push(
                self.target_os
                    .resolve()
                    .exit_on_error_command()
                    .to_string(),
            );
        }
        commands.extend(self.before_commands.iter().cloned());
        commands
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Render variables of this task in `ctx`.
    ///
    /// Under the docker runner the built-in `workingDir` points at the mount
    /// inside the container. A caller-supplied `workingDir` is kept.
    pub fn render_variables(&self, ctx: &RunContext) -> Value {
        let mut variables = ctx.variables().clone();
        if self.task_runner == RunnerKind::Docker {
            let host_dir = ctx.working_dir().to_string_lossy();
            if let Some(dir) = variables.get_mut("workingDir") {
                if dir.as_str() == Some(&*host_dir) {
                    *dir = Value::from(CONTAINER_WORKING_DIR);
                }
            }
        }
        variables
    }

    /// The rendered argument vector this task would run with `variables`.
    pub fn command_line(&self, variables: &Value) -> Result<Vec<String>, CoreError> {
        let commands = render::render_all(&self.commands, variables)?;
        let before_commands = render::render_all(&self.before_commands_with_options(), variables)?;
        script_commands(
            self.interpreter.as_deref(),
            &before_commands,
            &commands,
            self.target_os,
        )
    }

    /// Execute the task in `ctx`.
    ///
    /// Resolves once the process exited, its output was drained and output
    /// files were collected. A non-zero exit code is returned in
    /// [`ScriptOutput::exit_code`], not as an error.
    pub async fn run(&self, ctx: &RunContext) -> Result<ScriptOutput, ScriptError> {
        self.validate()?;

        let logger = ctx.logger();
        let variables = self.render_variables(ctx);
        let command = self.command_line(&variables)?;
        let env_vars = self
            .env
            .iter()
            .map(|(key, value)| Ok((key.clone(), render::render(value, &variables)?)))
            .collect::<Result<Vec<_>, CoreError>>()?;
        let input_files = self
            .input_files
            .iter()
            .map(|(name, content)| Ok((name.clone(), render::render(content, &variables)?)))
            .collect::<Result<BTreeMap<_, _>, CoreError>>()?;
        // Output patterns are matched on the host, so they render with host paths.
        let matcher = OutputMatcher::new(&ctx.render_all(&self.output_files)?)?;

        fs::create_dir_all(ctx.working_dir()).await?;
        write_input_files(ctx.working_dir(), &input_files).await?;

        let request = ScriptRequest {
            command,
            env_vars,
            working_directory: ctx.working_dir().to_path_buf(),
            timeout: self.timeout().unwrap_or(ctx.default_timeout()),
        };

        tracing::info!(
            task_id = %self.id,
            execution_id = %ctx.execution_id(),
            kind = %self.kind,
            runner = %self.task_runner,
            "Starting script task",
        );
        logger.info(format!(
            "Starting {} task '{}' with the {} runner",
            self.kind, self.id, self.task_runner
        ));

        let result = match self.task_runner {
            RunnerKind::Process => ProcessRunner.run(request, logger).await,
            RunnerKind::Docker => {
                let mut options = self.inject_defaults(&self.docker);
                options.image = options
                    .image
                    .map(|i| render::render(&i, &variables))
                    .transpose()?;
                DockerRunner::new(ctx.docker_binary(), options, ctx.container_name())
                    .run(request, logger)
                    .await
            }
        };

        let result = match result {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(task_id = %self.id, error = %e, "Script task failed");
                logger.error(e.to_string());
                return Err(e);
            }
        };

        let output_files = matcher.collect(ctx.working_dir()).await?;
        let warning = self.warning_on_std_err && result.std_err_line_count > 0;

        tracing::info!(
            task_id = %self.id,
            execution_id = %ctx.execution_id(),
            exit_code = result.exit_code,
            stdout_lines = result.std_out_line_count,
            stderr_lines = result.std_err_line_count,
            output_files = output_files.len(),
            duration_ms = result.duration_ms,
            "Script task finished",
        );

        Ok(ScriptOutput {
            exit_code: result.exit_code,
            std_out_line_count: result.std_out_line_count,
            std_err_line_count: result.std_err_line_count,
            vars: result.vars,
            output_files,
            duration_ms: result.duration_ms,
            warning,
        })
    }
}

fn validate_id(id: &str) -> Result<(), CoreError> {
    let mut chars = id.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphanumeric())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid task id '{id}': use letters, digits, '_' or '-', starting with a letter or digit"
        )))
    }
}

/// Validating builder for [`ScriptTask`].
#[derive(Debug, Clone)]
pub struct ScriptTaskBuilder {
    task: ScriptTask,
}

impl ScriptTaskBuilder {
    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.task.commands.push(command.into());
        self
    }

    pub fn commands<I, S>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.task.commands.extend(commands.into_iter().map(Into::into));
        self
    }

    pub fn before_commands<I, S>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.task
            .before_commands
            .extend(commands.into_iter().map(Into::into));
        self
    }

    pub fn interpreter<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.task.interpreter = Some(tokens.into_iter().map(Into::into).collect());
        self
    }

    pub fn target_os(mut self, target_os: TargetOs) -> Self {
        self.task.target_os = target_os;
        self
    }

    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.task.fail_fast = fail_fast;
        self
    }

    pub fn container_image(mut self, image: impl Into<String>) -> Self {
        self.task.container_image = Some(image.into());
        self
    }

    pub fn docker(mut self, options: DockerOptions) -> Self {
        self.task.docker = options;
        self
    }

    pub fn task_runner(mut self, runner: RunnerKind) -> Self {
        self.task.task_runner = runner;
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.task.env.insert(key.into(), value.into());
        self
    }

    pub fn input_file(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.task.input_files.insert(name.into(), content.into());
        self
    }

    pub fn output_file(mut self, pattern: impl Into<String>) -> Self {
        self.task.output_files.push(pattern.into());
        self
    }

    /// Timeout in whole seconds. Zero is rejected by `build`.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.task.timeout_secs = Some(secs);
        self
    }

    pub fn warning_on_std_err(mut self, warning: bool) -> Self {
        self.task.warning_on_std_err = warning;
        self
    }

    pub fn build(self) -> Result<ScriptTask, CoreError> {
        self.task.validate()?;
        Ok(self.task)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
