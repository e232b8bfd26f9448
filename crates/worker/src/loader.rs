//! Task definition files and `--var` parsing.

use std::path::Path;

use anyhow::{bail, Context};
use serde_json::{Map, Value};

use scriptrun_core::scripting::task::ScriptTask;

/// Read and validate a JSON task definition.
pub async fn load_task(path: &Path) -> anyhow::Result<ScriptTask> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read task file {}", path.display()))?;
    ScriptTask::from_json(&json)
        .with_context(|| format!("Invalid task definition in {}", path.display()))
}

/// Parse `KEY=VALUE` pairs into render variables.
///
/// Values that parse as JSON keep their type (`n=3` is a number); anything
/// else is a string. Later pairs override earlier ones.
pub fn parse_vars(pairs: &[String]) -> anyhow::Result<Map<String, Value>> {
    let mut vars = Map::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("Invalid variable '{pair}', expected KEY=VALUE");
        };
        let key = key.trim();
        if key.is_empty() {
            bail!("Invalid variable '{pair}', key is empty");
        }
        let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
        vars.insert(key.to_string(), value);
    }
    Ok(vars)
}
