//! Task log queue for scriptrun.
//!
//! - [`LogQueue`]: in-process append-only sink backed by
//!   `tokio::sync::broadcast`. Script runners publish, the host subscribes.
//! - [`LogEntry`]: one line of task output (or a runner message) with the
//!   task and execution it belongs to.

pub mod queue;

pub use queue::{LogEntry, LogLevel, LogQueue};
