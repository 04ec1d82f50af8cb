use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("tool load failed: {0}")]
    ToolLoadFailed(#[from] bqm_registry::RegistryError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to flush an in-memory chain image to disk: {0}")]
    FlushFailed(String),
}
