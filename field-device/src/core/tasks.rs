//! Background task management
//!
//! Every long-running task of the device is registered here with a role:
//!
//! - [`TaskRole::Pipeline`] - broker supervisor, aggregator and print worker.
//!   The device cannot produce briefings once any of them is gone.
//! - [`TaskRole::Auxiliary`] - push button, log housekeeping. Losing one
//!   degrades the device but briefings still print.
//!
//! Each task records how it ended ([`TaskExit`]). The pipeline is a chain of
//! channels, so one task panicking makes its neighbours return on their own
//! once their channel closes; [`HealthReport`] keeps the panicking task apart
//! from the ones that merely drained.

use futures::FutureExt;
use parking_lot::Mutex;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskRole {
    Pipeline,
    Auxiliary,
}

impl fmt::Display for TaskRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskRole::Pipeline => write!(f, "pipeline"),
            TaskRole::Auxiliary => write!(f, "auxiliary"),
        }
    }
}

/// How a task ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskExit {
    /// Returned after shutdown was requested
    Stopped,
    /// Returned on its own, usually because its input channel closed
    Drained,
    /// Panicked with this message
    Panicked(String),
}

/// A task that is no longer running
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadTask {
    pub name: &'static str,
    pub role: TaskRole,
    pub exit: TaskExit,
}

/// Result of [`BackgroundTasks::check_health`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthReport {
    pub dead: Vec<DeadTask>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.dead.is_empty()
    }

    /// Whether every pipeline task is still running
    pub fn pipeline_intact(&self) -> bool {
        !self.dead.iter().any(|t| t.role == TaskRole::Pipeline)
    }

    /// Pipeline tasks that are gone, whatever the cause
    pub fn pipeline_down(&self) -> Vec<&'static str> {
        self.dead
            .iter()
            .filter(|t| t.role == TaskRole::Pipeline)
            .map(|t| t.name)
            .collect()
    }

    /// Tasks that panicked
    pub fn panicked(&self) -> Vec<&'static str> {
        self.dead
            .iter()
            .filter(|t| matches!(t.exit, TaskExit::Panicked(_)))
            .map(|t| t.name)
            .collect()
    }
}

struct RegisteredTask {
    name: &'static str,
    role: TaskRole,
    exit: Arc<Mutex<Option<TaskExit>>>,
    handle: JoinHandle<()>,
}

/// Extract a readable message from a panic payload
pub fn panic_message(panic_info: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Task registry sharing one shutdown token
#[derive(Default)]
pub struct BackgroundTasks {
    tasks: Vec<RegisteredTask>,
    shutdown: CancellationToken,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancellation token observed by every task
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Register and start a task; its exit is recorded, panics included
    pub fn spawn<F>(&mut self, name: &'static str, role: TaskRole, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let shutdown = self.shutdown.clone();
        let exit = Arc::new(Mutex::new(None));
        let slot = exit.clone();

        let handle = tokio::spawn(async move {
            let outcome = match AssertUnwindSafe(future).catch_unwind().await {
                Ok(()) if shutdown.is_cancelled() => TaskExit::Stopped,
                Ok(()) => {
                    tracing::warn!(task = %name, role = %role, "Background task returned before shutdown");
                    TaskExit::Drained
                }
                Err(panic_info) => {
                    let message = panic_message(panic_info.as_ref());
                    tracing::error!(task = %name, role = %role, panic = %message, "Background task panicked");
                    TaskExit::Panicked(message)
                }
            };
            *slot.lock() = Some(outcome);
        });

        tracing::debug!(task = %name, role = %role, "Background task started");
        self.tasks.push(RegisteredTask {
            name,
            role,
            exit,
            handle,
        });
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tasks.iter().map(|t| t.name).collect()
    }

    /// Collect every task that has exited
    ///
    /// Panics are logged as errors. A pipeline task that drained is logged as
    /// a consequence when another task panicked, as a failure otherwise.
    pub fn check_health(&self) -> HealthReport {
        let dead: Vec<DeadTask> = self
            .tasks
            .iter()
            .filter(|t| t.handle.is_finished())
            .map(|t| DeadTask {
                name: t.name,
                role: t.role,
                exit: t
                    .exit
                    .lock()
                    .clone()
                    .unwrap_or_else(|| TaskExit::Panicked("aborted".into())),
            })
            .filter(|t| t.exit != TaskExit::Stopped)
            .collect();
        let report = HealthReport { dead };

        let panicked = report.panicked();
        for task in &report.dead {
            match &task.exit {
                TaskExit::Panicked(message) => {
                    tracing::error!(task = %task.name, role = %task.role, panic = %message, "Task is down after a panic");
                }
                TaskExit::Drained if !panicked.is_empty() => {
                    tracing::warn!(task = %task.name, caused_by = ?panicked, "Task drained after an upstream failure");
                }
                TaskExit::Drained => {
                    tracing::error!(task = %task.name, role = %task.role, "Task returned before shutdown");
                }
                TaskExit::Stopped => {}
            }
        }
        if !report.pipeline_intact() {
            tracing::error!(down = ?report.pipeline_down(), "Briefing pipeline is broken");
        }
        report
    }

    /// Cancel every task and wait for all of them
    pub async fn shutdown(self) {
        tracing::info!(tasks = self.tasks.len(), "Stopping background tasks");
        self.shutdown.cancel();

        for task in self.tasks {
            if let Err(e) = task.handle.await {
                tracing::warn!(task = %task.name, error = %e, "Background task did not join");
                continue;
            }
            match task.exit.lock().take() {
                Some(TaskExit::Stopped) => tracing::debug!(task = %task.name, "Task stopped"),
                Some(exit) => tracing::debug!(task = %task.name, ?exit, "Task had already exited"),
                None => {}
            }
        }

        tracing::info!("All background tasks stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use tokio::sync::mpsc;

    async fn settle(tasks: &BackgroundTasks, dead: usize) -> HealthReport {
        for _ in 0..200 {
            let report = tasks.check_health();
            if report.dead.len() >= dead {
                return report;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        tasks.check_health()
    }

    #[tokio::test]
    async fn test_shutdown_cancels_and_joins() {
        let mut tasks = BackgroundTasks::new();
        let token = tasks.shutdown_token();
        let stopped = Arc::new(AtomicBool::new(false));
        let flag = stopped.clone();

        tasks.spawn("waiter", TaskRole::Pipeline, async move {
            token.cancelled().await;
            flag.store(true, Ordering::SeqCst);
        });
        assert!(tasks.check_health().is_healthy());

        tasks.shutdown().await;
        assert!(stopped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_panic_is_told_apart_from_drained_neighbour() {
        let mut tasks = BackgroundTasks::new();
        let token = tasks.shutdown_token();
        let (tx, mut rx) = mpsc::channel::<()>(1);

        tasks.spawn("producer", TaskRole::Pipeline, async move {
            let _tx = tx;
            panic!("boom");
        });
        tasks.spawn("consumer", TaskRole::Pipeline, async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = async { while rx.recv().await.is_some() {} } => {}
            }
        });

        let report = settle(&tasks, 2).await;
        assert!(!report.pipeline_intact());
        assert_eq!(report.panicked(), vec!["producer"]);
        assert!(report.dead.contains(&DeadTask {
            name: "consumer",
            role: TaskRole::Pipeline,
            exit: TaskExit::Drained,
        }));
        assert!(report.dead.contains(&DeadTask {
            name: "producer",
            role: TaskRole::Pipeline,
            exit: TaskExit::Panicked("boom".into()),
        }));
        tasks.shutdown().await;
    }

    #[tokio::test]
    async fn test_auxiliary_exit_keeps_pipeline_intact() {
        let mut tasks = BackgroundTasks::new();
        let token = tasks.shutdown_token();
        tasks.spawn("worker", TaskRole::Pipeline, async move {
            token.cancelled().await;
        });
        tasks.spawn("housekeeping", TaskRole::Auxiliary, async {});

        let report = settle(&tasks, 1).await;
        assert!(!report.is_healthy());
        assert!(report.pipeline_intact());
        assert!(report.panicked().is_empty());
        assert_eq!(tasks.names(), vec!["worker", "housekeeping"]);
        tasks.shutdown().await;
    }

    #[test]
    fn test_panic_message() {
        let owned: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(owned.as_ref()), "owned");
        let other: Box<dyn std::any::Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(other.as_ref()), "Unknown panic");
    }
}
