use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue is empty")]
    Empty,

    #[error(transparent)]
    Registry(#[from] bqm_registry::RegistryError),
}
