//! Per-run context: identity, working directory, variables and logging.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use scriptrun_events::{LogEntry, LogLevel, LogQueue};
use serde_json::{json, Map, Value};
use tempfile::TempDir;

use crate::error::CoreError;
use crate::types::{ExecutionId, TaskId};

use super::render;

/// Used when neither the task nor the host sets a timeout (1 hour).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3600);

pub const DEFAULT_DOCKER_BINARY: &str = "docker";

/// Publishes log entries for one run to the shared [`LogQueue`].
#[derive(Clone)]
pub struct RunLogger {
    task_id: TaskId,
    execution_id: ExecutionId,
    queue: Arc<LogQueue>,
}

impl RunLogger {
    pub fn new(task_id: impl Into<TaskId>, execution_id: ExecutionId, queue: Arc<LogQueue>) -> Self {
        Self {
            task_id: task_id.into(),
            execution_id,
            queue,
        }
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        self.queue.publish(LogEntry::new(
            self.task_id.clone(),
            self.execution_id,
            level,
            message,
        ));
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }
}

/// Everything a task needs from its host for one run.
///
/// The working directory is either a scratch directory owned by the context
/// (removed when the context is dropped) or a caller-provided directory that
/// is left in place.
///
/// Built-in variables available to `{{ }}` placeholders:
///
/// | Variable        | Value                      |
/// |-----------------|----------------------------|
/// | `task.id`       | task id                    |
/// | `execution.id`  | execution id of this run   |
/// | `workingDir`    | absolute working directory |
pub struct RunContext {
    task_id: TaskId,
    execution_id: ExecutionId,
    working_dir: PathBuf,
    _scratch: Option<TempDir>,
    variables: Value,
    default_timeout: Duration,
    docker_binary: String,
    logger: RunLogger,
}

impl RunContext {
    /// Context with a scratch working directory under the system temp dir.
    pub fn new(task_id: impl Into<TaskId>, queue: Arc<LogQueue>) -> std::io::Result<Self> {
        let scratch = tempfile::Builder::new().prefix("scriptrun-").tempdir()?;
        Ok(Self::build(task_id.into(), queue, scratch.path().to_path_buf(), Some(scratch)))
    }

    /// Context with a scratch working directory under `base`.
    pub fn new_in(
        task_id: impl Into<TaskId>,
        queue: Arc<LogQueue>,
        base: &Path,
    ) -> std::io::Result<Self> {
        std::fs::create_dir_all(base)?;
        let scratch = tempfile::Builder::new()
            .prefix("scriptrun-")
            .tempdir_in(base)?;
        Ok(Self::build(task_id.into(), queue, scratch.path().to_path_buf(), Some(scratch)))
    }

    /// Context running in `dir`, which outlives the context.
    pub fn in_dir(task_id: impl Into<TaskId>, queue: Arc<LogQueue>, dir: impl Into<PathBuf>) -> Self {
        Self::build(task_id.into(), queue, dir.into(), None)
    }

    fn build(
        task_id: TaskId,
        queue: Arc<LogQueue>,
        working_dir: PathBuf,
        scratch: Option<TempDir>,
    ) -> Self {
        let execution_id = uuid::Uuid::now_v7();
        let variables = json!({
            "task": { "id": task_id },
            "execution": { "id": execution_id.to_string() },
            "workingDir": working_dir.to_string_lossy(),
        });
        let logger = RunLogger::new(task_id.clone(), execution_id, queue);
        Self {
            task_id,
            execution_id,
            working_dir,
            _scratch: scratch,
            variables,
            default_timeout: DEFAULT_TIMEOUT,
            docker_binary: DEFAULT_DOCKER_BINARY.to_string(),
            logger,
        }
    }

    /// Merge `variables` into the render variables. Built-ins can be shadowed.
    pub fn with_variables(mut self, variables: Map<String, Value>) -> Self {
        if let Value::Object(existing) = &mut self.variables {
            existing.extend(variables);
        }
        self
    }

    pub fn with_variable(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut map = Map::new();
        map.insert(key.into(), value.into());
        self.with_variables(map)
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn with_docker_binary(mut self, binary: impl Into<String>) -> Self {
        self.docker_binary = binary.into();
        self
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn execution_id(&self) -> ExecutionId {
        self.execution_id
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn variables(&self) -> &Value {
        &self.variables
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    pub fn docker_binary(&self) -> &str {
        &self.docker_binary
    }

    pub fn logger(&self) -> &RunLogger {
        &self.logger
    }

    /// Name given to the container of this run.
    pub fn container_name(&self) -> String {
        format!("scriptrun-{}", self.execution_id)
    }

    pub fn render(&self, template: &str) -> Result<String, CoreError> {
        render::render(template, &self.variables)
    }

    pub fn render_all(&self, templates: &[String]) -> Result<Vec<String>, CoreError> {
        render::render_all(templates, &self.variables)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
