// Copyright 2025 Salescope (https://github.com/salescope)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Bounded worker pool over a shared task queue.
//!
//! Lifecycle: a pool is created idle, `start` spawns the workers, `wait`
//! closes intake and lets them drain the queue, `stop` cancels
//! cooperatively — workers observe the signal between tasks, so an
//! executing task always runs to completion but queued work may be
//! skipped.
//!
//! Tasks are opaque closures; the pool assigns ids in submission order
//! and retains every failure in a mutex-guarded accumulator, so no error
//! is ever lost to a full channel.

use parking_lot::Mutex;
use salescope_core::{Result, SalescopeError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// An opaque unit of work. The pool never inspects the payload.
pub type Task = Box<dyn FnOnce() -> anyhow::Result<()> + Send + 'static>;

/// Worker pool sizing, fixed at construction.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub workers: usize,
    pub queue_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_capacity: 64,
        }
    }
}

/// A failed task: the id assigned at submission plus the task's error.
#[derive(Debug)]
pub struct TaskError {
    pub task_id: u64,
    pub source: anyhow::Error,
}

struct QueuedTask {
    id: u64,
    run: Task,
}

/// Fixed-size worker pool consuming one shared bounded queue.
pub struct WorkerPool {
    config: PoolConfig,
    sender: Option<mpsc::Sender<QueuedTask>>,
    /// Held until `start`, then handed to the workers.
    receiver: Option<mpsc::Receiver<QueuedTask>>,
    workers: Vec<JoinHandle<()>>,
    errors: Arc<Mutex<Vec<TaskError>>>,
    cancel: watch::Sender<bool>,
    cancel_rx: watch::Receiver<bool>,
    next_task_id: AtomicU64,
}

impl WorkerPool {
    pub fn new(config: PoolConfig) -> Result<Self> {
        if config.workers == 0 {
            return Err(SalescopeError::Config(
                "worker pool needs at least one worker".into(),
            ));
        }
        if config.queue_capacity == 0 {
            return Err(SalescopeError::Config(
                "task queue capacity must be non-zero".into(),
            ));
        }

        let (sender, receiver) = mpsc::channel(config.queue_capacity);
        let (cancel, cancel_rx) = watch::channel(false);

        Ok(Self {
            config,
            sender: Some(sender),
            receiver: Some(receiver),
            workers: Vec::new(),
            errors: Arc::new(Mutex::new(Vec::new())),
            cancel,
            cancel_rx,
            next_task_id: AtomicU64::new(0),
        })
    }

    /// Spawn the worker loops. Idempotent; tasks submitted before `start`
    /// simply sit in the queue until a worker picks them up.
    pub fn start(&mut self) {
        let Some(receiver) = self.receiver.take() else {
            return;
        };

        let shared = Arc::new(AsyncMutex::new(receiver));
        for worker_id in 0..self.config.workers {
            let queue = Arc::clone(&shared);
            let errors = Arc::clone(&self.errors);
            let cancel = self.cancel_rx.clone();
            self.workers
                .push(tokio::spawn(worker_loop(worker_id, queue, errors, cancel)));
        }
    }

    /// Enqueue a task and return its id (assigned in submission order).
    ///
    /// Awaits while the queue is full — that is the export pipeline's
    /// backpressure — but fails fast with [`SalescopeError::PoolClosed`]
    /// once the pool has been stopped or waited on.
    pub async fn submit(&self, task: Task) -> Result<u64> {
        if *self.cancel_rx.borrow() {
            return Err(SalescopeError::PoolClosed);
        }
        let sender = self.sender.as_ref().ok_or(SalescopeError::PoolClosed)?;

        let id = self.next_task_id.fetch_add(1, Ordering::Relaxed);
        sender
            .send(QueuedTask { id, run: task })
            .await
            .map_err(|_| SalescopeError::PoolClosed)?;
        Ok(id)
    }

    /// Graceful shutdown: close intake, then wait for the workers to
    /// finish everything already queued. Every task submitted before the
    /// call has run exactly once when this returns.
    pub async fn wait(&mut self) {
        self.sender.take();
        for handle in self.workers.drain(..) {
            let _ = handle.await;
        }
    }

    /// Abnormal shutdown: cancel and wait for the workers to exit. The
    /// task a worker is executing still completes; queued tasks may not
    /// run.
    pub async fn stop(&mut self) {
        let _ = self.cancel.send(true);
        self.sender.take();
        for handle in self.workers.drain(..) {
            let _ = handle.await;
        }
    }

    /// Drain every task failure recorded so far.
    pub fn take_errors(&self) -> Vec<TaskError> {
        std::mem::take(&mut *self.errors.lock())
    }
}

async fn worker_loop(
    worker_id: usize,
    queue: Arc<AsyncMutex<mpsc::Receiver<QueuedTask>>>,
    errors: Arc<Mutex<Vec<TaskError>>>,
    mut cancel: watch::Receiver<bool>,
) {
    debug!(worker_id, "export worker started");

    loop {
        if *cancel.borrow_and_update() {
            break;
        }

        let next = {
            let mut receiver = queue.lock().await;
            tokio::select! {
                biased;
                _ = cancel.changed() => None,
                task = receiver.recv() => task,
            }
        };

        let Some(task) = next else { break };
        if let Err(source) = (task.run)() {
            warn!(worker_id, task_id = task.id, error = %source, "task failed");
            errors.lock().push(TaskError {
                task_id: task.id,
                source,
            });
        }
    }

    debug!(worker_id, "export worker exiting");
}
