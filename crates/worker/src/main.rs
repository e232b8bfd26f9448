//! `scriptrun` -- runs script task definitions on this machine.
//!
//! # Environment variables
//!
//! | Variable                         | Default    | Description                              |
//! |----------------------------------|------------|------------------------------------------|
//! | `SCRIPTRUN_WORK_DIR`             | system tmp | Parent of per-run scratch directories    |
//! | `SCRIPTRUN_DOCKER_BIN`           | `docker`   | Docker-compatible CLI for `DOCKER` tasks |
//! | `SCRIPTRUN_DEFAULT_TIMEOUT_SECS` | `3600`     | Timeout of tasks that set none           |
//! | `SCRIPTRUN_LOG_QUEUE_CAPACITY`   | `1024`     | Buffered task log entries                |
//! | `SCRIPTRUN_LOG_FORMAT`           | `text`     | `text` or `json`                         |
//! | `RUST_LOG`                       | `scriptrun=info,scriptrun_worker=info,scriptrun_core=info` | Log filter |

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use scriptrun_events::LogQueue;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scriptrun_worker::cli::{Cli, Commands};
use scriptrun_worker::config::{LogFormat, WorkerConfig};
use scriptrun_worker::forward;
use scriptrun_worker::run::{self, RunOptions};

/// How long to wait for buffered task logs after the run finished.
const LOG_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = WorkerConfig::from_env()?;

    let json = config.log_format == LogFormat::Json;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "scriptrun=info,scriptrun_worker=info,scriptrun_core=info".into()
            }),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();

    match cli.command {
        Commands::Run {
            file,
            vars,
            work_dir,
            allow_failure,
        } => {
            let queue = Arc::new(LogQueue::new(config.log_queue_capacity));
            let forwarder = forward::spawn_forwarder(queue.subscribe());

            let options = RunOptions {
                file,
                vars,
                work_dir,
            };
            let result = run::run_file(&config, queue, &options).await;

            if tokio::time::timeout(LOG_DRAIN_TIMEOUT, forwarder).await.is_err() {
                tracing::warn!("Task log forwarding did not finish in time");
            }

            let output = result?;
            println!("{}", serde_json::to_string_pretty(&output)?);

            let code = run::exit_code(&output, allow_failure);
            if code != 0 {
                tracing::error!(exit_code = output.exit_code, "Script exited with a failure");
                std::process::exit(code);
            }
        }
        Commands::Schema { type_name } => {
            let doc = run::schema(type_name.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
        Commands::Kinds => {
            for line in run::kinds() {
                println!("{line}");
            }
        }
    }

    Ok(())
}
