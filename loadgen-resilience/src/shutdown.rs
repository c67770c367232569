//! Graceful shutdown coordination
//!
//! In-flight task tracking with a drain barrier.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{debug, warn};

/// Counts calls that have been launched but not yet completed
#[derive(Debug, Default)]
pub struct InFlightTracker {
    active: AtomicUsize,
    idle: Notify,
}

impl InFlightTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment active task counter
    pub fn task_started(&self) {
        self.active.fetch_add(1, Ordering::SeqCst);
    }

    /// Decrement active task counter, waking drain waiters at zero
    pub fn task_completed(&self) {
        let previous = self
            .active
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));

        match previous {
            Ok(1) => self.idle.notify_waiters(),
            Ok(_) => {}
            Err(_) => warn!("Task completion reported with no active tasks"),
        }
    }

    /// Get current active task count
    pub fn active_task_count(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Register a started task whose completion is reported on drop
    pub fn guard(self: &Arc<Self>) -> InFlightGuard {
        self.task_started();
        InFlightGuard {
            tracker: Arc::clone(self),
        }
    }

    /// Wait until no tasks are active
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            // Register interest before checking so a completion between the
            // check and the await is not lost.
            notified.as_mut().enable();

            let active = self.active_task_count();
            if active == 0 {
                return;
            }

            debug!("Waiting for {} in-flight tasks", active);
            notified.await;
        }
    }
}

/// Marks one in-flight task; completes it when dropped
#[derive(Debug)]
pub struct InFlightGuard {
    tracker: Arc<InFlightTracker>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.tracker.task_completed();
    }
}

/// Companion process errors
#[derive(Debug, thiserror::Error)]
pub enum ShutdownError {
    /// External process could not be launched
    #[error("Failed to start process {program}: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// External process could not be terminated or reaped
    #[error("Failed to stop process {program}: {source}")]
    TerminateFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_task_counting() {
        let tracker = InFlightTracker::new();
        assert_eq!(tracker.active_task_count(), 0);

        tracker.task_started();
        tracker.task_started();
        assert_eq!(tracker.active_task_count(), 2);

        tracker.task_completed();
        assert_eq!(tracker.active_task_count(), 1);

        tracker.task_completed();
        assert_eq!(tracker.active_task_count(), 0);

        // Extra completion doesn't go negative
        tracker.task_completed();
        assert_eq!(tracker.active_task_count(), 0);
    }

    #[tokio::test]
    async fn test_wait_idle_returns_immediately_when_empty() {
        let tracker = InFlightTracker::new();
        timeout(Duration::from_millis(10), tracker.wait_idle())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_guard_completes_on_drop() {
        let tracker = Arc::new(InFlightTracker::new());

        let guard = tracker.guard();
        assert_eq!(tracker.active_task_count(), 1);

        drop(guard);
        assert_eq!(tracker.active_task_count(), 0);
    }

    #[tokio::test]
    async fn test_wait_idle_blocks_until_drained() {
        let tracker = Arc::new(InFlightTracker::new());

        for delay in [10, 30, 50] {
            let guard = tracker.guard();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                drop(guard);
            });
        }

        assert_eq!(tracker.active_task_count(), 3);
        timeout(Duration::from_secs(2), tracker.wait_idle())
            .await
            .unwrap();
        assert_eq!(tracker.active_task_count(), 0);
    }

    #[tokio::test]
    async fn test_guard_completes_when_task_panics() {
        let tracker = Arc::new(InFlightTracker::new());

        let guard = tracker.guard();
        let handle = tokio::spawn(async move {
            let _guard = guard;
            panic!("call failed");
        });

        assert!(handle.await.is_err());
        assert_eq!(tracker.active_task_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_idle_pends_while_tasks_active() {
        let tracker = InFlightTracker::new();
        tracker.task_started();

        let result = timeout(Duration::from_millis(100), tracker.wait_idle()).await;
        assert!(result.is_err());
        assert_eq!(tracker.active_task_count(), 1);
    }
}
