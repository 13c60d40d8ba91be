pub mod tasks;

pub use tasks::{BackgroundTask, BackgroundTaskManager, TaskManagerConfig};
