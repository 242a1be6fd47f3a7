//! Owned handles for spawned timelines.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use tokio::task::JoinHandle;
use tracing::debug;

/// The timelines spawned on behalf of one session.
///
/// Aborting the set (or dropping it) cancels every timeline that has not
/// finished. Once shut down the set refuses new work.
#[derive(Default)]
pub struct TaskSet {
    handles: Mutex<Vec<(&'static str, JoinHandle<()>)>>,
    closed: AtomicBool,
}

impl TaskSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a timeline owned by this set. Returns false after shutdown.
    pub fn spawn<F>(&self, name: &'static str, future: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        // `closed` is only flipped while the handle list is locked, so a
        // timeline accepted here is always seen by `shutdown`.
        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        if self.closed.load(Ordering::SeqCst) {
            debug!(task = name, "Task set closed, not spawning");
            return false;
        }

        let handle = tokio::spawn(future);
        handles.retain(|(_, h)| !h.is_finished());
        handles.push((name, handle));
        true
    }

    /// Number of timelines still running.
    pub fn active(&self) -> usize {
        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        handles.retain(|(_, h)| !h.is_finished());
        handles.len()
    }

    /// Abort every running timeline and refuse new ones. Returns how many were aborted.
    pub fn shutdown(&self) -> usize {
        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        self.closed.store(true, Ordering::SeqCst);
        let mut aborted = 0;
        for (name, handle) in handles.drain(..) {
            if !handle.is_finished() {
                debug!(task = name, "Aborting timeline");
                handle.abort();
                aborted += 1;
            }
        }
        aborted
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Drop for TaskSet {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_finished_tasks_are_pruned() {
        let tasks = TaskSet::new();
        tasks.spawn("quick", async {});
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(tasks.active(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_aborts_pending_timelines() {
        let tasks = TaskSet::new();
        let fired = Arc::new(AtomicBool::new(false));
        let flag = fired.clone();

        tasks.spawn("slow", async move {
            tokio::time::sleep(Duration::from_secs(10)).await;
            flag.store(true, Ordering::SeqCst);
        });
        assert_eq!(tasks.active(), 1);

        assert_eq!(tasks.shutdown(), 1);
        tokio::time::sleep(Duration::from_secs(20)).await;

        assert!(!fired.load(Ordering::SeqCst));
        assert!(!tasks.spawn("late", async {}));
        assert!(tasks.is_closed());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_spawn_racing_shutdown_never_outlives_it() {
        let mut flags = Vec::new();
        for _ in 0..50 {
            let tasks = Arc::new(TaskSet::new());
            let fired = Arc::new(AtomicBool::new(false));
            let (racer, flag) = (tasks.clone(), fired.clone());

            let spawner = tokio::spawn(async move {
                racer.spawn("racing", async move {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    flag.store(true, Ordering::SeqCst);
                });
            });
            tasks.shutdown();
            spawner.await.unwrap();

            // Whatever won the race, nothing may be left running.
            assert_eq!(tasks.active(), 0);
            flags.push((tasks, fired));
        }

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(flags.iter().all(|(_, fired)| !fired.load(Ordering::SeqCst)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_aborts() {
        let fired = Arc::new(AtomicBool::new(false));
        {
            let tasks = TaskSet::new();
            let flag = fired.clone();
            tasks.spawn("slow", async move {
                tokio::time::sleep(Duration::from_secs(1)).await;
                flag.store(true, Ordering::SeqCst);
            });
        }
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!fired.load(Ordering::SeqCst));
    }
}
