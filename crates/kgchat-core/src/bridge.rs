//! Run async work from synchronous call sites.
//!
//! The reasoning loop and the tool capabilities it dispatches are plain
//! synchronous code, while the clients they call (LLM, MCP) are async. The
//! [`ExecutionContext`] decides per call how the future gets driven:
//!
//! - A multi-thread tokio runtime is reachable from this thread: the future is
//!   spawned onto that runtime and the calling thread parks until the task
//!   reports back.
//! - A current-thread runtime is reachable: parking its only scheduler thread
//!   would deadlock, and tokio cannot tell that thread apart from its blocking
//!   pool, so the future runs on a helper thread with a runtime of its own.
//! - No runtime: a current-thread runtime is built for this one future and torn
//!   down as soon as it completes.
//!
//! The choice is made at the call site and never cached, so a thread that
//! later enters a runtime (or leaves one) gets the right behaviour.

use std::future::Future;
use std::sync::mpsc;

use tokio::runtime::{Builder, Handle, RuntimeFlavor};
use tracing::trace;

use crate::error::{BridgeError, BridgeResult};

/// Where a bridged future will run.
#[derive(Debug, Clone)]
pub enum ExecutionContext {
    /// Schedule onto the multi-thread runtime this thread already belongs to.
    Existing(Handle),
    /// The caller sits on a current-thread runtime; run on a helper thread.
    Isolated,
    /// Spin up a dedicated runtime for a single future.
    Dedicated,
}

impl ExecutionContext {
    /// Pick the context for the current thread.
    #[must_use]
    pub fn detect() -> Self {
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                Self::Existing(handle)
            },
            Ok(_) => Self::Isolated,
            Err(_) => Self::Dedicated,
        }
    }

    /// Whether the future will be handed to an already running runtime.
    #[must_use]
    pub fn is_existing(&self) -> bool {
        matches!(self, Self::Existing(_))
    }

    /// Drive `future` to completion and return its output.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::RuntimeBuild`] if a dedicated runtime cannot be
    /// created, or [`BridgeError::TaskAborted`] if the task panicked or was
    /// cancelled before producing a result.
    pub fn run<F>(self, future: F) -> BridgeResult<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        match self {
            Self::Existing(handle) => run_on_existing(&handle, future),
            Self::Isolated => run_isolated(future),
            Self::Dedicated => run_dedicated(future),
        }
    }
}

/// Run an async future synchronously, choosing the execution context for the
/// calling thread.
///
/// # Errors
///
/// See [`ExecutionContext::run`].
pub fn block_on<F>(future: F) -> BridgeResult<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    let context = ExecutionContext::detect();
    trace!(existing = context.is_existing(), "Bridging async call");
    context.run(future)
}

fn run_on_existing<F>(handle: &Handle, future: F) -> BridgeResult<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    let (tx, rx) = mpsc::sync_channel(1);
    handle.spawn(async move {
        // The receiver only disappears if the caller unwound.
        let _ = tx.send(future.await);
    });

    // Parking a worker thread would starve the scheduler; hand its core to
    // another thread first. Outside worker threads this is a no-op.
    tokio::task::block_in_place(move || rx.recv().map_err(|_| BridgeError::TaskAborted))
}

fn run_isolated<F>(future: F) -> BridgeResult<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    std::thread::Builder::new()
        .name("kgchat-bridge".to_string())
        .spawn(move || run_dedicated(future))?
        .join()
        .map_err(|_| BridgeError::TaskAborted)?
}

fn run_dedicated<F: Future>(future: F) -> BridgeResult<F::Output> {
    let runtime = Builder::new_current_thread().enable_all().build()?;
    let output = runtime.block_on(future);
    drop(runtime);
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_dedicated_without_runtime() {
        assert!(!ExecutionContext::detect().is_existing());

        let value = block_on(async {
            tokio::time::sleep(Duration::from_millis(1)).await;
            41_u32.saturating_add(1)
        })
        .unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_dedicated_runtime_is_not_reused() {
        // Each call builds its own runtime, so nothing leaks into the thread.
        block_on(async {}).unwrap();
        assert!(Handle::try_current().is_err());
        block_on(async {}).unwrap();
        assert!(Handle::try_current().is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_existing_from_worker_thread() {
        assert!(ExecutionContext::detect().is_existing());

        let value = block_on(async {
            tokio::time::sleep(Duration::from_millis(1)).await;
            "scheduled"
        })
        .unwrap();
        assert_eq!(value, "scheduled");
    }

    #[tokio::test]
    async fn test_current_thread_runtime_thread_does_not_deadlock() {
        assert!(matches!(ExecutionContext::detect(), ExecutionContext::Isolated));

        let value = block_on(async {
            tokio::time::sleep(Duration::from_millis(1)).await;
            "isolated"
        })
        .unwrap();
        assert_eq!(value, "isolated");
    }

    #[tokio::test]
    async fn test_current_thread_runtime_task_does_not_deadlock() {
        let value = tokio::spawn(async {
            block_on(async {
                tokio::time::sleep(Duration::from_millis(1)).await;
                3_u8
            })
        })
        .await
        .unwrap()
        .unwrap();
        assert_eq!(value, 3);
    }

    #[tokio::test]
    async fn test_blocking_thread_on_current_thread_runtime() {
        let value = tokio::task::spawn_blocking(|| {
            assert!(!ExecutionContext::detect().is_existing());
            block_on(async {
                tokio::time::sleep(Duration::from_millis(1)).await;
                7_u8
            })
        })
        .await
        .unwrap()
        .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_panicking_task_reports_aborted() {
        let fail = true;
        let result = block_on(async move {
            assert!(!fail, "task failure");
            1_u8
        });
        assert!(matches!(result, Err(BridgeError::TaskAborted)));
    }
}
