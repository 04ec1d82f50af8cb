use thiserror::Error;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error(transparent)]
    Task(#[from] bqm_task::TaskError),
}
