use crate::{MapError, Result};
use crossbeam_channel::{bounded, unbounded, Sender, TrySendError};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// A unit of fire-and-forget work executed on the worker pool.
pub trait BackgroundTask: Send {
    /// Get the task ID (used for logging only)
    fn task_id(&self) -> &str;

    /// Run the task to completion
    fn execute(self: Box<Self>);
}

/// Adapter that turns a closure into a [`BackgroundTask`]
struct FnTask<F> {
    id: String,
    f: F,
}

impl<F> BackgroundTask for FnTask<F>
where
    F: FnOnce() + Send,
{
    fn task_id(&self) -> &str {
        &self.id
    }

    fn execute(self: Box<Self>) {
        (self.f)()
    }
}

/// Configuration for the background task manager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskManagerConfig {
    /// Number of worker threads. Zero runs every task inline on the submitter.
    pub max_concurrent_tasks: usize,
    /// Maximum number of queued tasks; `None` means unbounded
    pub max_queue_size: Option<usize>,
    /// Test mode - tasks execute synchronously and immediately
    pub test_mode: bool,
}

impl Default for TaskManagerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_tasks: 2,
            max_queue_size: Some(1024),
            test_mode: false,
        }
    }
}

impl TaskManagerConfig {
    pub fn for_testing() -> Self {
        Self {
            test_mode: true,
            ..Default::default()
        }
    }

    fn runs_inline(&self) -> bool {
        self.test_mode || self.max_concurrent_tasks == 0
    }
}

/// Fixed pool of worker threads fed by a channel.
///
/// Tasks are executed in submission order per worker. Dropping the manager
/// closes the queue and joins every worker after the queue drains.
pub struct BackgroundTaskManager {
    name: String,
    task_tx: Option<Sender<Box<dyn BackgroundTask>>>,
    workers: Vec<JoinHandle<()>>,
    completed: Arc<AtomicUsize>,
    closed: bool,
}

impl BackgroundTaskManager {
    /// Create a new background task manager and start its workers
    pub fn new(name: &str, config: &TaskManagerConfig) -> Self {
        let completed = Arc::new(AtomicUsize::new(0));

        if config.runs_inline() {
            log::debug!("task manager '{}' running tasks inline", name);
            return Self {
                name: name.to_string(),
                task_tx: None,
                workers: Vec::new(),
                completed,
                closed: false,
            };
        }

        let (task_tx, task_rx) = match config.max_queue_size {
            Some(capacity) => bounded::<Box<dyn BackgroundTask>>(capacity),
            None => unbounded(),
        };

        let mut workers = Vec::with_capacity(config.max_concurrent_tasks);
        for index in 0..config.max_concurrent_tasks {
            let task_rx = task_rx.clone();
            let completed = completed.clone();
            let spawned = std::thread::Builder::new()
                .name(format!("{}-worker-{}", name, index))
                .spawn(move || {
                    for task in task_rx.iter() {
                        log::trace!("running task {}", task.task_id());
                        task.execute();
                        completed.fetch_add(1, Ordering::SeqCst);
                    }
                });
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => log::error!("failed to spawn worker {} for '{}': {}", index, name, e),
            }
        }

        if workers.is_empty() {
            log::warn!("task manager '{}' has no workers, falling back to inline", name);
            return Self {
                name: name.to_string(),
                task_tx: None,
                workers,
                completed,
                closed: false,
            };
        }

        log::info!("task manager '{}' started {} workers", name, workers.len());
        Self {
            name: name.to_string(),
            task_tx: Some(task_tx),
            workers,
            completed,
            closed: false,
        }
    }

    /// Create a task manager that executes every task on the caller
    pub fn inline(name: &str) -> Self {
        Self::new(name, &TaskManagerConfig::for_testing())
    }

    /// Submit a task for background processing
    pub fn submit(&self, task: Box<dyn BackgroundTask>) -> Result<()> {
        let Some(task_tx) = &self.task_tx else {
            if self.closed {
                return Err(MapError::TaskQueueClosed);
            }
            task.execute();
            self.completed.fetch_add(1, Ordering::SeqCst);
            return Ok(());
        };

        match task_tx.try_send(task) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(task)) => {
                log::warn!("queue of '{}' is full, dropping task {}", self.name, task.task_id());
                Err(MapError::TaskQueueFull)
            }
            Err(TrySendError::Disconnected(_)) => Err(MapError::TaskQueueClosed),
        }
    }

    /// Submit a closure as a task
    pub fn submit_fn<F>(&self, id: impl Into<String>, f: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.submit(Box::new(FnTask { id: id.into(), f }))
    }

    /// Whether tasks run on the submitting thread
    pub fn is_inline(&self) -> bool {
        self.task_tx.is_none() && !self.closed
    }

    /// Get the current number of queued tasks
    pub fn queued_tasks(&self) -> usize {
        self.task_tx.as_ref().map(|tx| tx.len()).unwrap_or(0)
    }

    /// Number of tasks that ran to completion
    pub fn completed_tasks(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Close the queue and wait for the workers to drain it
    pub fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.task_tx = None;
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                log::error!("a worker of '{}' panicked", self.name);
            }
        }
        log::info!("task manager '{}' shut down", self.name);
    }
}

impl Drop for BackgroundTaskManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for BackgroundTaskManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundTaskManager")
            .field("name", &self.name)
            .field("workers", &self.workers.len())
            .field("inline", &self.is_inline())
            .finish()
    }
}
