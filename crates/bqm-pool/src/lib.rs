//! Concurrent worker pool.

pub mod error;
pub mod event;
pub mod pool;

pub use error::PoolError;
pub use event::PoolEvent;
pub use pool::WorkerPool;
