//! Forwards task log entries from the [`LogQueue`](scriptrun_events::LogQueue)
//! to `tracing`.

use scriptrun_events::{LogEntry, LogLevel};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

/// Target of forwarded task output, so it can be filtered separately.
pub const TASK_LOG_TARGET: &str = "scriptrun::task";

/// Emit `entry` as a tracing event at the entry's level.
pub fn emit(entry: &LogEntry) {
    let task_id = entry.task_id.as_str();
    let execution_id = entry.execution_id.to_string();
    let message = entry.message.as_str();
    match entry.level {
        LogLevel::Trace => {
            tracing::trace!(target: TASK_LOG_TARGET, task_id, %execution_id, "{message}")
        }
        LogLevel::Debug => {
            tracing::debug!(target: TASK_LOG_TARGET, task_id, %execution_id, "{message}")
        }
        LogLevel::Info => {
            tracing::info!(target: TASK_LOG_TARGET, task_id, %execution_id, "{message}")
        }
        LogLevel::Warn => {
            tracing::warn!(target: TASK_LOG_TARGET, task_id, %execution_id, "{message}")
        }
        LogLevel::Error => {
            tracing::error!(target: TASK_LOG_TARGET, task_id, %execution_id, "{message}")
        }
    }
}

/// Forward every entry received on `rx` until all senders are gone.
///
/// Returns the number of entries forwarded.
pub fn spawn_forwarder(mut rx: broadcast::Receiver<LogEntry>) -> JoinHandle<u64> {
    tokio::spawn(async move {
        let mut forwarded = 0;
        loop {
            match rx.recv().await {
                Ok(entry) => {
                    emit(&entry);
                    forwarded += 1;
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Log forwarder lagged, task log entries dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
        forwarded
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use scriptrun_core::types::ExecutionId;
    use scriptrun_events::LogQueue;

    use super::*;

    #[tokio::test]
    async fn forwarder_stops_when_queue_is_dropped() {
        let queue = Arc::new(LogQueue::new(8));
        let handle = spawn_forwarder(queue.subscribe());
        let id = ExecutionId::nil();

        queue.publish(LogEntry::new("t", id, LogLevel::Info, "one"));
        queue.publish(LogEntry::new("t", id, LogLevel::Warn, "two"));
        drop(queue);

        let forwarded = handle.await.expect("join");
        assert_eq!(forwarded, 2);
    }
}
