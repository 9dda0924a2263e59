//! Blocking bridge for async HTTP clients
//!
//! The domain ports are synchronous, while the HTTP clients are async. The
//! bridge drives a future to completion from synchronous code: it reuses the
//! ambient tokio runtime when one exists and otherwise owns a small
//! current-thread runtime.
//!
//! Calls must come from a blocking thread (e.g. `tokio::task::spawn_blocking`)
//! or from outside any runtime, never from an async task.

use std::future::Future;
use tokio::runtime::{Builder, Handle, Runtime};

enum Executor {
    Shared(Handle),
    Owned(Runtime),
}

/// Runs async work to completion from synchronous callers
pub struct BlockingBridge {
    executor: Executor,
}

impl BlockingBridge {
    /// Create a bridge bound to the current runtime, or a private one
    pub fn new() -> std::io::Result<Self> {
        let executor = match Handle::try_current() {
            Ok(handle) => Executor::Shared(handle),
            Err(_) => Executor::Owned(Builder::new_current_thread().enable_all().build()?),
        };
        Ok(Self { executor })
    }

    /// Whether the bridge owns its runtime
    pub fn owns_runtime(&self) -> bool {
        matches!(self.executor, Executor::Owned(_))
    }

    /// Block the calling thread until `future` completes
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        match &self.executor {
            Executor::Shared(handle) => handle.block_on(future),
            Executor::Owned(runtime) => runtime.block_on(future),
        }
    }
}

impl std::fmt::Debug for BlockingBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingBridge")
            .field("owns_runtime", &self.owns_runtime())
            .finish()
    }
}
