//! Execution contexts.
//!
//! The bridge never runs host or UI work on the thread that happens to call it. Work is
//! handed to an [`ExecutionContext`] instead, which queues it and returns immediately.
//! [`SerialExecutor`] is the stock implementation: a single tokio worker drains a FIFO
//! queue, so tasks posted from one thread run in the order they were posted and never
//! run concurrently with each other.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Mutex;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Unit of work handed to an execution context
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// A serialized context that accepts work without blocking the caller.
pub trait ExecutionContext: Send + Sync {
    /// Name of the context (used in logs)
    fn name(&self) -> &str;

    /// Queue a task. Must not block and must not run the task inline.
    fn execute(&self, task: Task);
}

pub struct SerialExecutor {
    name: String,
    tx: mpsc::UnboundedSender<Task>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for SerialExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialExecutor")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl SerialExecutor {
    /// Creates the executor and spawns its worker on the given runtime.
    pub fn new(name: impl Into<String>, runtime: &Handle) -> Self {
        let name = name.into();
        let (tx, mut rx) = mpsc::unbounded_channel::<Task>();

        let worker_name = name.clone();
        let worker = runtime.spawn(async move {
            while let Some(task) = rx.recv().await {
                if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(task)) {
                    log::error!("[{worker_name}] task panicked: {}", panic_message(payload.as_ref()));
                }
            }
            log::debug!("[{worker_name}] execution context stopped");
        });

        Self {
            name,
            tx,
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Resolves once every task queued before this call has run.
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        self.execute(Box::new(move || {
            let _ = tx.send(());
        }));
        let _ = rx.await;
    }

    /// Stops the worker. Tasks still queued are dropped.
    pub fn shutdown(&self) {
        let worker = self
            .worker
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take();
        if let Some(worker) = worker {
            worker.abort();
        }
    }
}

// Panic payloads are `&str` or `String` unless the task panicked with a custom value.
fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        *msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "non-string panic payload"
    }
}

impl ExecutionContext for SerialExecutor {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, task: Task) {
        if self.tx.send(task).is_err() {
            log::warn!("[{}] execution context closed, task dropped", self.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn tasks_run_in_post_order() {
        let exec = SerialExecutor::new("host", &Handle::current());
        let seen = Arc::new(Mutex::new(Vec::new()));

        for i in 0..32 {
            let seen = seen.clone();
            exec.execute(Box::new(move || seen.lock().unwrap().push(i)));
        }
        exec.flush().await;

        let seen = seen.lock().unwrap();
        assert_eq!(*seen, (0..32).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn panicking_task_does_not_stop_the_worker() {
        let exec = SerialExecutor::new("host", &Handle::current());
        let seen = Arc::new(Mutex::new(Vec::new()));

        exec.execute(Box::new(|| panic!("listener blew up")));
        let s = seen.clone();
        exec.execute(Box::new(move || s.lock().unwrap().push("after")));
        exec.flush().await;

        assert_eq!(*seen.lock().unwrap(), vec!["after"]);
    }

    #[test]
    fn panic_messages_are_readable() {
        let literal = panic::catch_unwind(|| panic!("listener blew up")).unwrap_err();
        assert_eq!(panic_message(literal.as_ref()), "listener blew up");

        let formatted = panic::catch_unwind(|| panic!("zone {} blew up", "zoneA")).unwrap_err();
        assert_eq!(panic_message(formatted.as_ref()), "zone zoneA blew up");

        let custom = panic::catch_unwind(|| std::panic::panic_any(7u8)).unwrap_err();
        assert_eq!(panic_message(custom.as_ref()), "non-string panic payload");
    }

    #[tokio::test]
    async fn execute_after_shutdown_is_dropped() {
        let exec = SerialExecutor::new("ui", &Handle::current());
        exec.shutdown();
        // worker is gone; posting must neither panic nor block
        exec.execute(Box::new(|| {}));
        assert_eq!(exec.name(), "ui");
    }
}
