// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use tokio::runtime::Handle;

use crate::traits::{Task, TaskExecutor};

/// Runs every task inline on the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImmediateExecutor;

impl TaskExecutor for ImmediateExecutor {
    fn run(&self, task: Task) {
        task()
    }

    fn name(&self) -> &'static str {
        "immediate"
    }
}

/// Runs tasks on the blocking pool of a tokio runtime.
///
/// Tasks may block (a user completion callback, a drain), so they go to
/// `spawn_blocking` rather than the async worker threads.
#[derive(Debug, Clone)]
pub struct TokioExecutor {
    handle: Handle,
}

impl TokioExecutor {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Executor bound to the runtime the caller is running in, if any.
    pub fn current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }
}

impl TaskExecutor for TokioExecutor {
    fn run(&self, task: Task) {
        self.handle.spawn_blocking(task);
    }

    fn name(&self) -> &'static str {
        "tokio"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_immediate_executor_runs_inline() {
        let caller = std::thread::current().id();
        let (tx, rx) = mpsc::channel();
        ImmediateExecutor.run(Box::new(move || {
            tx.send(std::thread::current().id()).unwrap();
        }));
        assert_eq!(rx.try_recv().unwrap(), caller);
    }

    #[tokio::test]
    async fn test_tokio_executor_runs_off_the_caller_thread() {
        let executor = TokioExecutor::current().expect("inside a runtime");
        let caller = std::thread::current().id();
        let (tx, rx) = tokio::sync::oneshot::channel();
        executor.run(Box::new(move || {
            let _ = tx.send(std::thread::current().id());
        }));

        let worker = rx.await.unwrap();
        assert_ne!(worker, caller);
        assert_eq!(executor.name(), "tokio");
    }

    #[test]
    fn test_no_current_runtime_outside_tokio() {
        assert!(TokioExecutor::current().is_none());
    }
}
