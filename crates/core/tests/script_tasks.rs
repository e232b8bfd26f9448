//! End-to-end runs of script tasks through the local process runner.
//!
//! Tests that need `malloy-cli`, `ruby` or a docker daemon are `#[ignore]`d;
//! run them with `cargo test -- --ignored` on a machine that has them.

use std::sync::Arc;

use scriptrun_core::scripting::commands::TargetOs;
use scriptrun_core::scripting::context::RunContext;
use scriptrun_core::scripting::kind::TaskKind;
use scriptrun_core::scripting::task::{RunnerKind, ScriptTask};
use scriptrun_events::{LogLevel, LogQueue};

fn context(task_id: &str) -> (RunContext, tokio::sync::broadcast::Receiver<scriptrun_events::LogEntry>) {
    let queue = Arc::new(LogQueue::default());
    let rx = queue.subscribe();
    (RunContext::new(task_id, queue).expect("context"), rx)
}

// ---------------------------------------------------------------------------
// Test: echo through the shell kind
// ---------------------------------------------------------------------------

/// The always-available equivalent of running `malloy-cli --help`: exit code
/// 0, a positive stdout line count, no stderr.
#[tokio::test]
async fn echo_reports_stdout_lines_and_no_stderr() {
    let (ctx, mut rx) = context("echo");
    let task = ScriptTask::builder(TaskKind::ShellCommands, "echo")
        .target_os(TargetOs::Linux)
        .before_commands(["echo setup"])
        .commands(["echo 'Usage: tool [options]'", "echo '  --help  show help'"])
        .build()
        .expect("build");

    let output = task.run(&ctx).await.expect("run");

    assert_eq!(output.exit_code, 0);
    assert_eq!(output.std_out_line_count, 3);
    assert_eq!(output.std_err_line_count, 0);
    assert!(!output.warning);

    let lines: Vec<String> = std::iter::from_fn(|| rx.try_recv().ok())
        .filter(|e| e.level == LogLevel::Info)
        .map(|e| e.message)
        .collect();
    let setup = lines.iter().position(|l| l == "setup").expect("setup logged");
    let usage = lines
        .iter()
        .position(|l| l == "Usage: tool [options]")
        .expect("usage logged");
    assert!(setup < usage, "setup commands run before user commands");
}

/// A JSON definition goes through the same path as the builder.
#[tokio::test]
async fn json_definition_runs_with_input_and_output_files() {
    let (ctx, _rx) = context("csv");
    let task = ScriptTask::from_json(
        r#"{
          "id": "csv",
          "type": "scripts.shell.Commands",
          "targetOs": "linux",
          "inputFiles": {"data.txt": "a\nb\nc\n"},
          "commands": [
            "wc -l < data.txt | tr -d ' ' > count.csv",
            "echo \"::{\\\"outputs\\\": {\\\"rows\\\": $(cat count.csv)}}::\""
          ],
          "outputFiles": ["*.csv"]
        }"#,
    )
    .expect("parse");

    let output = task.run(&ctx).await.expect("run");

    assert_eq!(output.exit_code, 0);
    assert_eq!(output.vars["rows"], serde_json::json!(3));
    assert!(output.output_files.contains_key("count.csv"));
}

// ---------------------------------------------------------------------------
// Tests needing external tools
// ---------------------------------------------------------------------------

#[tokio::test]
#[ignore = "requires malloy-cli on PATH"]
async fn malloy_cli_help() {
    let (ctx, _rx) = context("malloy");
    let task = ScriptTask::builder(TaskKind::MalloyCli, "malloy")
        .command("malloy-cli --help")
        .build()
        .expect("build");

    let output = task.run(&ctx).await.expect("run");

    assert_eq!(output.exit_code, 0);
    assert!(output.std_out_line_count > 0);
    assert_eq!(output.std_err_line_count, 0);
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn ruby_in_default_image() {
    let (ctx, _rx) = context("ruby");
    let task = ScriptTask::builder(TaskKind::RubyCommands, "ruby")
        .task_runner(RunnerKind::Docker)
        .input_file("main.rb", "puts 'hello from ruby'\n")
        .command("ruby main.rb")
        .build()
        .expect("build");

    let output = task.run(&ctx).await.expect("run");

    assert_eq!(output.exit_code, 0);
    assert_eq!(output.std_out_line_count, 1);
}
