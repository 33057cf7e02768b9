// src/tools/async_support.rs
//! Runtime helpers: dispatch work onto its own task and join on it later.

use std::future::Future;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::core::errors::HealthCheckError;

/// A unit of work running on its own tokio task.
///
/// `exec` starts the work immediately; `wait` blocks the caller until it
/// finishes. No timeout is layered on top: the work is expected to bound
/// itself. Dropping a `BlockedWait` detaches the task instead of aborting it,
/// so once dispatched the work always runs to completion.
#[derive(Debug)]
pub struct BlockedWait<T> {
    handle: JoinHandle<T>,
    operation_name: &'static str,
}

impl<T: Send + 'static> BlockedWait<T> {
    /// Spawn `future` onto the current runtime.
    pub fn exec<F>(operation_name: &'static str, future: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        debug!(operation = operation_name, "Dispatching background operation");
        Self { handle: tokio::spawn(future), operation_name }
    }

    /// Join on the operation. A panic inside it comes back as
    /// [`HealthCheckError::Task`] instead of tearing the process down.
    pub async fn wait(self) -> Result<T, HealthCheckError> {
        match self.handle.await {
            Ok(value) => Ok(value),
            Err(e) if e.is_panic() => Err(HealthCheckError::Task(format!(
                "operation '{}' panicked: {}",
                self.operation_name,
                panic_message(e.into_panic())
            ))),
            Err(e) => Err(HealthCheckError::Task(format!(
                "operation '{}' did not complete: {}",
                self.operation_name, e
            ))),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
