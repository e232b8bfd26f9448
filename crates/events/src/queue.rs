//! In-process log queue backed by a `tokio::sync::broadcast` channel.
//!
//! [`LogQueue`] receives every [`LogEntry`] produced while a task runs. It is
//! shared via `Arc<LogQueue>` between the run context and the host that
//! forwards entries to its logging pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// LogLevel
// ---------------------------------------------------------------------------

/// Severity of a [`LogEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// LogEntry
// ---------------------------------------------------------------------------

/// A single log record emitted while a task executes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Id of the task definition that produced the entry.
    pub task_id: String,

    /// Id of the individual run.
    pub execution_id: Uuid,

    pub level: LogLevel,

    pub message: String,

    /// When the entry was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    /// Create an entry stamped with the current time.
    pub fn new(
        task_id: impl Into<String>,
        execution_id: Uuid,
        level: LogLevel,
        message: impl Into<String>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            execution_id,
            level,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// LogQueue
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Append-only fan-out log sink.
///
/// Producers never read entries back. When the buffer is full the oldest
/// un-consumed entries are dropped and slow receivers observe
/// `RecvError::Lagged`.
///
/// ```rust
/// use scriptrun_events::{LogEntry, LogLevel, LogQueue};
///
/// let queue = LogQueue::default();
/// let mut rx = queue.subscribe();
///
/// queue.publish(LogEntry::new("hello", uuid::Uuid::now_v7(), LogLevel::Info, "hi"));
/// ```
pub struct LogQueue {
    sender: broadcast::Sender<LogEntry>,
}

impl LogQueue {
    /// Create a queue with a specific channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Append an entry. Entries published with no subscriber are dropped.
    pub fn publish(&self, entry: LogEntry) {
        let _ = self.sender.send(entry);
    }

    /// Subscribe to every entry published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.sender.subscribe()
    }
}

impl Default for LogQueue {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let queue = LogQueue::default();
        let mut rx = queue.subscribe();
        let execution_id = Uuid::now_v7();

        queue.publish(LogEntry::new(
            "ruby_task",
            execution_id,
            LogLevel::Info,
            "ruby 3.3.0",
        ));

        let received = rx.recv().await.expect("should receive the entry");
        assert_eq!(received.task_id, "ruby_task");
        assert_eq!(received.execution_id, execution_id);
        assert_eq!(received.level, LogLevel::Info);
        assert_eq!(received.message, "ruby 3.3.0");
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_entry() {
        let queue = LogQueue::default();
        let mut rx1 = queue.subscribe();
        let mut rx2 = queue.subscribe();

        queue.publish(LogEntry::new("t", Uuid::now_v7(), LogLevel::Warn, "careful"));

        let e1 = rx1.recv().await.expect("subscriber 1 should receive");
        let e2 = rx2.recv().await.expect("subscriber 2 should receive");
        assert_eq!(e1.message, "careful");
        assert_eq!(e2.message, "careful");
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let queue = LogQueue::default();
        queue.publish(LogEntry::new("t", Uuid::now_v7(), LogLevel::Error, "lost"));
    }

    #[test]
    fn entries_are_received_in_publish_order() {
        let queue = LogQueue::new(8);
        let mut rx = queue.subscribe();
        let id = Uuid::now_v7();

        for i in 0..3 {
            queue.publish(LogEntry::new("t", id, LogLevel::Info, format!("line {i}")));
        }

        let messages: Vec<String> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|e| e.message)
            .collect();
        assert_eq!(messages, vec!["line 0", "line 1", "line 2"]);
    }

    #[test]
    fn entry_serializes_with_camel_case_and_uppercase_level() {
        let entry = LogEntry::new("task", Uuid::now_v7(), LogLevel::Warn, "msg");
        let json = serde_json::to_value(&entry).expect("serialize");
        assert_eq!(json["taskId"], "task");
        assert_eq!(json["level"], "WARN");
        assert!(json["executionId"].is_string());
    }

    #[test]
    fn levels_order_by_severity() {
        assert!(LogLevel::Trace < LogLevel::Info);
        assert!(LogLevel::Warn < LogLevel::Error);
        assert_eq!(LogLevel::Info.to_string(), "INFO");
    }
}
