//! `{{ variable }}` placeholder rendering for dynamic task properties.
//!
//! Placeholders name a top-level variable or a dotted path into nested JSON
//! objects (`{{ inputs.region }}`). Strings render verbatim, other JSON
//! values render as compact JSON. Unknown variables are an error.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::Value;

use crate::error::CoreError;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_\-]*(?:\.[A-Za-z0-9_\-]+)*)\s*\}\}")
        .expect("placeholder pattern is valid")
});

/// Render every placeholder in `template` from `variables`.
pub fn render(template: &str, variables: &Value) -> Result<String, CoreError> {
    let mut missing: Option<String> = None;

    let rendered = PLACEHOLDER.replace_all(template, |caps: &Captures<'_>| {
        let path = &caps[1];
        match lookup(variables, path) {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => {
                missing.get_or_insert_with(|| path.to_string());
                String::new()
            }
        }
    });

    match missing {
        Some(path) => Err(CoreError::Render(format!("Unknown variable '{path}'"))),
        None => Ok(rendered.into_owned()),
    }
}

/// Render each string of `templates`, keeping their order.
pub fn render_all(templates: &[String], variables: &Value) -> Result<Vec<String>, CoreError> {
    templates.iter().map(|t| render(t, variables)).collect()
}

fn lookup<'a>(variables: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(variables, |value, segment| value.as_object()?.get(segment))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
