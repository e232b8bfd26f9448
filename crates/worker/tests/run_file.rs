//! Integration tests for running task definition files the way the
//! `scriptrun` binary does.

use std::sync::Arc;
use std::time::Duration;

use scriptrun_events::LogQueue;
use scriptrun_worker::config::WorkerConfig;
use scriptrun_worker::forward;
use scriptrun_worker::run::{exit_code, run_file, RunOptions};

fn write_task(dir: &std::path::Path, json: &str) -> std::path::PathBuf {
    let path = dir.join("task.json");
    std::fs::write(&path, json).expect("write task file");
    path
}

#[tokio::test]
async fn runs_task_file_with_variables_in_work_dir() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let work = dir.path().join("work");
    let file = write_task(
        dir.path(),
        r#"{
          "id": "greet",
          "type": "scripts.shell.Commands",
          "targetOs": "LINUX",
          "commands": ["echo 'hello {{ name }}' > greeting.txt", "cat greeting.txt"],
          "outputFiles": ["greeting.txt"]
        }"#,
    );

    let queue = Arc::new(LogQueue::default());
    let forwarder = forward::spawn_forwarder(queue.subscribe());
    let options = RunOptions {
        file,
        vars: vec!["name=world".to_string()],
        work_dir: Some(work.clone()),
    };

    let output = run_file(&WorkerConfig::default(), queue, &options)
        .await
        .expect("run");

    assert_eq!(output.exit_code, 0);
    assert_eq!(output.std_out_line_count, 1);
    assert_eq!(
        std::fs::read_to_string(work.join("greeting.txt")).expect("read"),
        "hello world\n"
    );
    assert_eq!(exit_code(&output, false), 0);

    let forwarded = tokio::time::timeout(Duration::from_secs(5), forwarder)
        .await
        .expect("forwarder finished")
        .expect("join");
    assert!(forwarded >= 1);
}

#[tokio::test]
async fn failing_script_maps_to_process_exit_code() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let file = write_task(
        dir.path(),
        r#"{"id": "fail", "type": "scripts.shell.Commands", "targetOs": "LINUX", "commands": ["exit 4"]}"#,
    );
    let config = WorkerConfig {
        work_dir: Some(dir.path().join("runs")),
        ..WorkerConfig::default()
    };
    let options = RunOptions {
        file,
        ..RunOptions::default()
    };

    let output = run_file(&config, Arc::new(LogQueue::default()), &options)
        .await
        .expect("run");

    assert_eq!(output.exit_code, 4);
    assert_eq!(exit_code(&output, false), 4);
    assert_eq!(exit_code(&output, true), 0);
}

#[tokio::test]
async fn missing_file_is_an_error() {
    let options = RunOptions {
        file: "/nonexistent/scriptrun/task.json".into(),
        ..RunOptions::default()
    };
    let err = run_file(&WorkerConfig::default(), Arc::new(LogQueue::default()), &options)
        .await
        .expect_err("should fail");
    assert!(format!("{err:#}").contains("task.json"));
}
