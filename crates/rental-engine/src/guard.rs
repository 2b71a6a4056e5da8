//! # Stock Mutation Guard
//!
//! Serializes destructive, inventory-affecting operations.
//!
//! ## Queue Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Mutation Guard Flow                                │
//! │                                                                         │
//! │  caller A ──acquire(delete p1)──┐                                       │
//! │  caller B ──acquire(delete p1)──┼──► unbounded FIFO ──► GuardWorker     │
//! │  caller C ──acquire(set pack)───┘                          │            │
//! │                                                            ▼            │
//! │                                     run A to completion ──► reply A     │
//! │                                     run B to completion ──► reply B     │
//! │                                     run C to completion ──► reply C     │
//! │                                                                         │
//! │  • Exactly one guarded operation is in flight at any time              │
//! │  • Each caller gets its own operation's outcome (oneshot reply)        │
//! │  • A panicking operation fails only its caller                         │
//! │  • Worker exits once every MutationGuard handle is dropped and the     │
//! │    queue is drained                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Reads never go through the guard. Neither do order creation or stock
//! adjustments, so check-then-reserve is not atomic with respect to guarded
//! work.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use crate::error::{EngineError, EngineResult};

type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

// =============================================================================
// Guard Handle
// =============================================================================

/// Handle for submitting operations to the guard.
///
/// Cheap to clone. Every clone feeds the same queue.
#[derive(Debug, Clone)]
pub struct MutationGuard {
    jobs: mpsc::UnboundedSender<Job>,
}

/// A submitted operation awaiting its turn.
#[derive(Debug)]
pub struct Pending<T> {
    reply: oneshot::Receiver<EngineResult<T>>,
}

impl<T> Pending<T> {
    /// Waits for the operation's own outcome.
    pub async fn wait(self) -> EngineResult<T> {
        self.reply
            .await
            .map_err(|_| EngineError::internal("guarded operation aborted before replying"))?
    }
}

impl MutationGuard {
    /// Creates a guard and spawns its worker on the current tokio runtime.
    pub fn spawn() -> Self {
        let (worker, guard) = GuardWorker::new();
        tokio::spawn(worker.run());
        guard
    }

    /// Enqueues `op` without waiting. Queue order is call order.
    ///
    /// The operation runs even if the returned [`Pending`] is dropped.
    pub fn submit<Fut, T>(&self, op: Fut) -> EngineResult<Pending<T>>
    where
        Fut: Future<Output = EngineResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let job: Job = Box::pin(async move {
            // Receiver gone means the caller stopped waiting.
            let _ = reply_tx.send(op.await);
        });

        self.jobs
            .send(job)
            .map_err(|_| EngineError::internal("mutation guard worker is not running"))?;

        Ok(Pending { reply: reply_rx })
    }

    /// Runs `op` after every previously submitted operation has finished.
    pub async fn acquire<Fut, T>(&self, op: Fut) -> EngineResult<T>
    where
        Fut: Future<Output = EngineResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        self.submit(op)?.wait().await
    }

    /// Returns true once the worker has stopped accepting work.
    pub fn is_closed(&self) -> bool {
        self.jobs.is_closed()
    }
}

// =============================================================================
// Guard Worker
// =============================================================================

/// Drains the guard queue one operation at a time.
pub struct GuardWorker {
    jobs: mpsc::UnboundedReceiver<Job>,
}

impl GuardWorker {
    /// Creates a worker and the handle that feeds it.
    pub fn new() -> (Self, MutationGuard) {
        let (jobs_tx, jobs_rx) = mpsc::unbounded_channel();
        (GuardWorker { jobs: jobs_rx }, MutationGuard { jobs: jobs_tx })
    }

    /// Runs the worker loop.
    ///
    /// This should be spawned as a background task.
    pub async fn run(mut self) {
        info!("Mutation guard worker starting");
        let mut completed: u64 = 0;

        while let Some(job) = self.jobs.recv().await {
            // A separate task isolates panics: the job's reply sender is
            // dropped and only its caller sees the failure.
            match tokio::spawn(job).await {
                Ok(()) => completed += 1,
                Err(e) if e.is_panic() => error!("Guarded operation panicked"),
                Err(e) => error!(error = %e, "Guarded operation was cancelled"),
            }
            debug!(completed, "Guarded operation finished");
        }

        info!(completed, "Mutation guard worker stopped");
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_fifo_and_mutual_exclusion() {
        let guard = MutationGuard::spawn();
        let order = Arc::new(Mutex::new(Vec::new()));
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut pending = Vec::new();
        for i in 0..8u64 {
            let order = order.clone();
            let in_flight = in_flight.clone();
            let max_seen = max_seen.clone();
            pending.push(
                guard
                    .submit(async move {
                        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                        max_seen.fetch_max(now, Ordering::SeqCst);
                        // Earlier jobs sleep longer; FIFO must still hold.
                        tokio::time::sleep(Duration::from_millis(16 - 2 * i)).await;
                        order.lock().unwrap().push(i);
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                        Ok::<_, EngineError>(i)
                    })
                    .unwrap(),
            );
        }

        for (i, p) in pending.into_iter().enumerate() {
            assert_eq!(p.wait().await.unwrap(), i as u64);
        }
        assert_eq!(*order.lock().unwrap(), (0..8).collect::<Vec<_>>());
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_each_caller_gets_its_own_error() {
        let guard = MutationGuard::spawn();

        let failing = guard
            .submit(async { Err::<(), _>(EngineError::not_found("Product", "ghost")) })
            .unwrap();
        let ok = guard.submit(async { Ok::<_, EngineError>("done") }).unwrap();

        assert!(matches!(
            failing.wait().await,
            Err(EngineError::NotFound { .. })
        ));
        assert_eq!(ok.wait().await.unwrap(), "done");
    }

    #[tokio::test]
    async fn test_panic_fails_only_its_caller() {
        let guard = MutationGuard::spawn();

        let doomed = guard
            .submit(async {
                if true {
                    panic!("boom");
                }
                Ok::<(), EngineError>(())
            })
            .unwrap();
        let survivor = guard.submit(async { Ok::<_, EngineError>(7) }).unwrap();

        assert!(matches!(doomed.wait().await, Err(EngineError::Internal(_))));
        assert_eq!(survivor.wait().await.unwrap(), 7);
        assert_eq!(guard.acquire(async { Ok::<_, EngineError>(8) }).await.unwrap(), 8);
    }

    #[tokio::test]
    async fn test_worker_drains_then_exits() {
        let (worker, guard) = GuardWorker::new();
        let ran = Arc::new(AtomicUsize::new(0));

        let mut pending = Vec::new();
        for _ in 0..3 {
            let ran = ran.clone();
            pending.push(
                guard
                    .submit(async move {
                        ran.fetch_add(1, Ordering::SeqCst);
                        Ok::<(), EngineError>(())
                    })
                    .unwrap(),
            );
        }
        drop(guard);

        // Worker starts after the last handle is gone and still drains.
        tokio::time::timeout(Duration::from_secs(5), worker.run())
            .await
            .unwrap();
        assert_eq!(ran.load(Ordering::SeqCst), 3);
        for p in pending {
            p.wait().await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_submit_after_worker_stopped() {
        let (worker, guard) = GuardWorker::new();
        drop(worker);

        assert!(guard.is_closed());
        let err = guard.acquire(async { Ok::<(), EngineError>(()) }).await.unwrap_err();
        assert!(matches!(err, EngineError::Internal(_)));
    }
}
