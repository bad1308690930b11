//! Bounded runner for fire-and-forget work.
//!
//! Click increments and cache population run after the response has been
//! produced. Each job is a detached tokio task, so dropping the request
//! future (client disconnect, timeout) never aborts it. A semaphore caps the
//! number of jobs in flight; when the cap is reached new jobs are dropped and
//! counted instead of queueing without bound.

use metrics::counter;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Semaphore;
use tracing::warn;

/// Default maximum number of background jobs in flight.
pub const DEFAULT_BACKGROUND_TASK_LIMIT: usize = 1024;

/// Shared handle for spawning detached background jobs.
///
/// Cloning is cheap; clones share the same limit and drop counter.
#[derive(Clone)]
pub struct BackgroundTasks {
    permits: Arc<Semaphore>,
    limit: usize,
    dropped: Arc<AtomicU64>,
}

impl BackgroundTasks {
    /// Creates a runner allowing at most `limit` concurrent jobs (minimum 1).
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);

        Self {
            permits: Arc::new(Semaphore::new(limit)),
            limit,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Spawns `job` unless the in-flight limit is reached.
    ///
    /// Returns `false` if the job was dropped. `task` names the job in logs
    /// and in the `background_tasks_dropped_total` counter.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<F>(&self, task: &'static str, job: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match Arc::clone(&self.permits).try_acquire_owned() {
            Ok(permit) => {
                tokio::spawn(async move {
                    job.await;
                    drop(permit);
                });
                true
            }
            Err(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                counter!("background_tasks_dropped_total", "task" => task).increment(1);
                warn!(task, limit = self.limit, "Background task limit reached, dropping job");
                false
            }
        }
    }

    /// Number of jobs currently running.
    pub fn in_flight(&self) -> usize {
        self.limit - self.permits.available_permits()
    }

    /// Total number of jobs dropped since creation.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Default for BackgroundTasks {
    fn default() -> Self {
        Self::new(DEFAULT_BACKGROUND_TASK_LIMIT)
    }
}
