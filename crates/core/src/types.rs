/// Identifier of a task definition, as written in the task file.
pub type TaskId = String;

/// Every run gets a fresh time-ordered UUID.
pub type ExecutionId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
