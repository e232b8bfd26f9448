//! Host-side execution of one task definition.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use serde_json::Value;

use scriptrun_core::scripting::context::RunContext;
use scriptrun_core::scripting::executor::ScriptOutput;
use scriptrun_core::scripting::kind::TaskKind;
use scriptrun_events::LogQueue;

use crate::config::WorkerConfig;
use crate::loader;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub file: PathBuf,
    pub vars: Vec<String>,
    pub work_dir: Option<PathBuf>,
}

/// Load, run and return the result of the task in `options.file`.
///
/// The run context (and its scratch directory) is dropped before returning.
pub async fn run_file(
    config: &WorkerConfig,
    queue: Arc<LogQueue>,
    options: &RunOptions,
) -> anyhow::Result<ScriptOutput> {
    let task = loader::load_task(&options.file).await?;
    let vars = loader::parse_vars(&options.vars)?;

    let ctx = match (&options.work_dir, &config.work_dir) {
        (Some(dir), _) => RunContext::in_dir(task.id.clone(), queue, dir.clone()),
        (None, Some(base)) => RunContext::new_in(task.id.clone(), queue, base)
            .with_context(|| format!("Failed to create scratch directory in {}", base.display()))?,
        (None, None) => RunContext::new(task.id.clone(), queue)
            .context("Failed to create scratch directory")?,
    };
    let ctx = ctx
        .with_variables(vars)
        .with_default_timeout(config.default_timeout)
        .with_docker_binary(config.docker_binary.clone());

    tracing::info!(
        task_id = %task.id,
        execution_id = %ctx.execution_id(),
        working_dir = %ctx.working_dir().display(),
        "Running task",
    );

    task.run(&ctx)
        .await
        .with_context(|| format!("Task '{}' failed", task.id))
}

/// Process exit code for a finished run.
pub fn exit_code(output: &ScriptOutput, allow_failure: bool) -> i32 {
    if output.exit_code == 0 || allow_failure {
        0
    } else if (1..=255).contains(&output.exit_code) {
        output.exit_code
    } else {
        1
    }
}

/// JSON schema document for one task type, or an array of all of them.
pub fn schema(type_name: Option<&str>) -> anyhow::Result<Value> {
    match type_name {
        Some(name) => {
            let kind: TaskKind = name.parse()?;
            Ok(serde_json::to_value(kind.doc())?)
        }
        None => {
            let docs: Vec<_> = TaskKind::ALL.iter().map(|k| k.doc()).collect();
            Ok(serde_json::to_value(docs)?)
        }
    }
}

/// `type<TAB>default image` lines.
pub fn kinds() -> Vec<String> {
    TaskKind::ALL
        .iter()
        .map(|k| format!("{}\t{}", k.type_name(), k.default_image()))
        .collect()
}
