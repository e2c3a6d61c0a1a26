//! Named background tasks that outlive a single request.
//!
//! The registry is owned by `main` and handed to services at construction.
//! It only tracks abort handles; whoever spawns a task keeps its
//! `JoinHandle` and decides whether to await it.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::task::{AbortHandle, JoinHandle};

#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: Mutex<HashMap<String, AbortHandle>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, AbortHandle>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Spawn `future` under `name` unless a task with that name is still running.
    ///
    /// The check and the registration happen under one lock, so concurrent
    /// callers start at most one task per name. Returns `None` when a live
    /// task already holds the name.
    pub fn spawn_unique<F>(&self, name: &str, future: F) -> Option<JoinHandle<F::Output>>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let mut tasks = self.lock();
        tasks.retain(|_, task| !task.is_finished());
        if tasks.contains_key(name) {
            tracing::debug!(task = name, "background task already running");
            return None;
        }

        let handle = tokio::spawn(future);
        tasks.insert(name.to_string(), handle.abort_handle());
        tracing::debug!(task = name, "spawned background task");
        Some(handle)
    }

    /// Whether a task named `name` is still running.
    pub fn find(&self, name: &str) -> bool {
        self.lock().get(name).is_some_and(|task| !task.is_finished())
    }

    /// Abort every tracked task, returning how many were still running.
    pub fn cancel_all(&self) -> usize {
        let mut cancelled = 0;
        for (name, task) in self.lock().drain() {
            if !task.is_finished() {
                task.abort();
                cancelled += 1;
                tracing::info!(task = %name, "cancelled background task");
            }
        }
        cancelled
    }
}
