//! Script task plugins and the runners that execute them.
//!
//! A task kind ([`kind::TaskKind`]) only contributes a type name, a default
//! container image and documentation. Everything else is shared: command
//! assembly, rendering, working-directory files and the process/docker
//! runners. Subprocess management is pure (no host access) so the whole
//! path is testable without a scheduler.

pub mod commands;
pub mod container;
pub mod context;
pub mod docker;
pub mod docs;
pub mod executor;
pub mod files;
pub mod kind;
pub mod log_consumer;
pub mod process;
pub mod render;
pub mod subprocess;
pub mod task;

/// Shared test helpers for runner tests.
#[cfg(test)]
pub(crate) mod test_helpers {
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;

    use scriptrun_events::{LogEntry, LogQueue};
    use tokio::sync::broadcast;

    use super::context::RunLogger;
    use super::executor::ScriptRequest;

    /// A logger wired to a fresh queue, plus a receiver on that queue.
    pub fn test_logger() -> (RunLogger, broadcast::Receiver<LogEntry>) {
        let queue = Arc::new(LogQueue::new(256));
        let rx = queue.subscribe();
        (RunLogger::new("test", uuid::Uuid::now_v7(), queue), rx)
    }

    /// `/bin/sh -c <script>` in `dir` with a 5-second timeout.
    pub fn sh_request(dir: &Path, script: &str) -> ScriptRequest {
        ScriptRequest {
            command: vec!["/bin/sh".to_string(), "-c".to_string(), script.to_string()],
            env_vars: vec![],
            working_directory: dir.to_path_buf(),
            timeout: Duration::from_secs(5),
        }
    }

    /// Every entry currently buffered on `rx`.
    pub fn drain(rx: &mut broadcast::Receiver<LogEntry>) -> Vec<LogEntry> {
        let mut entries = Vec::new();
        while let Ok(entry) = rx.try_recv() {
            entries.push(entry);
        }
        entries
    }
}
