//! Thread pool for parallel system execution.

pub mod executor;

pub use executor::{Executor, ExecutorHandle, Scope, TaskError, TaskFuture};
