//! Detached background work that must never reach the response path.

use std::fmt::Display;
use std::future::Future;

use tokio_util::task::TaskTracker;

/// Tracks fire-and-forget tasks such as edge cache stores.
///
/// Each task runs behind its own error boundary: a failure is logged and
/// dropped. Panics stay inside the spawned task.
#[derive(Clone, Default)]
pub struct BackgroundTasks {
    tracker: TaskTracker,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `task` without waiting for it.
    pub fn spawn<F, E>(&self, name: &'static str, task: F)
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        self.tracker.spawn(async move {
            if let Err(e) = task.await {
                tracing::warn!(task = name, error = %e, "Background task failed");
            }
        });
    }

    /// Number of tasks still running.
    pub fn len(&self) -> usize {
        self.tracker.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracker.is_empty()
    }

    /// Wait until every task spawned so far has finished.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }
}
