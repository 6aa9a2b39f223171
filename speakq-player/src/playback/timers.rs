//! Cancellable scheduled tasks
//!
//! A `TaskSlot` holds at most one spawned task. Starting a new task or
//! cancelling aborts the previous one and bumps the slot's generation, so a
//! message the old task already posted can be recognised as stale by the
//! receiver.

use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug, Default)]
pub struct TaskSlot {
    generation: u64,
    task: Option<JoinHandle<()>>,
}

impl TaskSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `make(generation)`, replacing any task already in the slot
    pub fn start<F, Fut>(&mut self, make: F) -> u64
    where
        F: FnOnce(u64) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let generation = self.generation;
        self.task = Some(tokio::spawn(make(generation)));
        generation
    }

    /// Post `make(generation)` on `tx` once `delay` has elapsed
    pub fn schedule<T, F>(&mut self, delay: Duration, tx: mpsc::UnboundedSender<T>, make: F) -> u64
    where
        T: Send + 'static,
        F: FnOnce(u64) -> T + Send + 'static,
    {
        self.start(move |generation| async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(make(generation));
        })
    }

    /// Abort the pending task, if any; messages it already posted become stale
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.generation = self.generation.wrapping_add(1);
    }

    /// Accept a message from the task of `generation`
    ///
    /// Returns false for stale messages. On success the slot is emptied.
    pub fn finish(&mut self, generation: u64) -> bool {
        if self.task.is_some() && generation == self.generation {
            self.task = None;
            true
        } else {
            false
        }
    }
}

impl Drop for TaskSlot {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
