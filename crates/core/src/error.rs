#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unsupported target OS: '{0}'. Must be one of: LINUX, WINDOWS, AUTO")]
    UnsupportedTargetOs(String),

    #[error("Unknown task type: '{0}'")]
    UnknownTaskType(String),

    #[error("Rendering failed: {0}")]
    Render(String),

    #[error("Invalid task definition: {0}")]
    Definition(#[from] serde_json::Error),
}
