//! Task pool for long-running background work.
//!
//! # Responsibilities
//! - Spawn provider feeds and their helpers on the runtime
//! - Hand each task a stop signal on request
//! - On shutdown, signal every task and wait for all of them
//!
//! # Design Decisions
//! - A panic inside a task is caught and logged; siblings keep running
//! - Tasks spawned while the pool is stopping are joined too
//! - Cloning a pool is cheap; every clone drives the same task set

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::FutureExt;
use tokio::task::JoinSet;

use crate::lifecycle::shutdown::{Shutdown, StopSignal};

/// Shared task launcher with a single stop signal.
#[derive(Debug, Clone, Default)]
pub struct Pool {
    inner: Arc<PoolInner>,
}

#[derive(Debug, Default)]
struct PoolInner {
    shutdown: Shutdown,
    tasks: Mutex<JoinSet<()>>,
}

impl Pool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` concurrently.
    pub fn go<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let guarded = async move {
            if let Err(panic) = AssertUnwindSafe(task).catch_unwind().await {
                tracing::error!(panic = panic_message(&*panic), "Pool task panicked");
            }
        };

        let mut tasks = self.inner.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        // Reap finished tasks so the set only holds live ones.
        while let Some(res) = tasks.try_join_next() {
            if let Err(e) = res {
                tracing::error!(error = %e, "Pool task aborted");
            }
        }
        tasks.spawn(guarded);
    }

    /// Run the task built by `f` concurrently, handing it the pool's stop signal.
    pub fn go_ctx<F, Fut>(&self, f: F)
    where
        F: FnOnce(StopSignal) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.go(f(self.stop_signal()));
    }

    /// A stop signal tied to this pool.
    pub fn stop_signal(&self) -> StopSignal {
        self.inner.shutdown.subscribe()
    }

    /// Whether [`Pool::stop`] has been called.
    pub fn is_stopping(&self) -> bool {
        self.inner.shutdown.is_triggered()
    }

    /// Number of tasks not yet reaped.
    pub fn len(&self) -> usize {
        self.inner
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the pool holds no tasks.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Signal every task to stop and wait until they have all finished.
    pub async fn stop(&self) {
        self.inner.shutdown.trigger();
        tracing::debug!("Pool stopping, waiting for tasks");

        loop {
            let mut tasks = std::mem::take(
                &mut *self
                    .inner
                    .tasks
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner),
            );
            if tasks.is_empty() {
                break;
            }
            while let Some(res) = tasks.join_next().await {
                if let Err(e) = res {
                    tracing::error!(error = %e, "Pool task aborted");
                }
            }
        }

        tracing::debug!("Pool stopped");
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_stop_waits_for_ctx_tasks() {
        let pool = Pool::new();
        let finished = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let finished = finished.clone();
            pool.go_ctx(|mut stop| async move {
                stop.stopped().await;
                finished.fetch_add(1, Ordering::SeqCst);
            });
        }

        assert_eq!(pool.len(), 3);
        tokio::time::timeout(Duration::from_secs(1), pool.stop())
            .await
            .unwrap();
        assert_eq!(finished.load(Ordering::SeqCst), 3);
        assert!(pool.is_empty());
        assert!(pool.is_stopping());
    }

    #[tokio::test]
    async fn test_panicking_task_does_not_affect_siblings() {
        let pool = Pool::new();
        let finished = Arc::new(AtomicUsize::new(0));

        pool.go(async { panic!("broken provider") });
        let sibling = finished.clone();
        pool.go(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            sibling.fetch_add(1, Ordering::SeqCst);
        });

        pool.stop().await;
        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_tasks_spawned_during_stop_are_joined() {
        let pool = Pool::new();
        let finished = Arc::new(AtomicUsize::new(0));

        let spawner = pool.clone();
        let counter = finished.clone();
        pool.go_ctx(|mut stop| async move {
            stop.stopped().await;
            spawner.go(async move {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        });

        pool.stop().await;
        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_finished_tasks_are_reaped_on_spawn() {
        let pool = Pool::new();
        for _ in 0..100 {
            pool.go(async {});
        }
        tokio::time::sleep(Duration::from_millis(50)).await;

        pool.go(async {});
        assert!(pool.len() <= 1);
        pool.stop().await;
    }
}
