// SPDX-License-Identifier: MIT

use crate::error::PoolError;
use crate::lock_recover;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;

/// Trait defining a general task structure, with an execute method to be
/// implemented by each task.
pub trait Task {
    fn execute(&self);
}

/// Mutable pool state, always accessed under the pool mutex.
struct PoolState {
    /// Queue of tasks for worker threads.
    task_queue: VecDeque<Arc<dyn Task + Send + Sync>>,
    /// Tasks a worker has dequeued but not yet finished.
    in_flight: usize,
    /// Tasks that panicked since the last `stop_wait`.
    panicked: usize,
    /// Set once the pool stops accepting tasks. Workers exit when it is set
    /// and the queue is empty.
    shutdown_flag: bool,
}

/// State shared between the pool handle and its workers.
struct PoolShared {
    state: Mutex<PoolState>,
    /// Notifies workers of new tasks or shutdown.
    task_available: Condvar,
    /// Notifies `barrier` callers that the queue is empty and no task runs.
    idle: Condvar,
}

impl PoolState {
    fn new() -> Self {
        PoolState {
            task_queue: VecDeque::with_capacity(128),
            in_flight: 0,
            panicked: 0,
            shutdown_flag: false,
        }
    }

    fn is_idle(&self) -> bool {
        self.task_queue.is_empty() && self.in_flight == 0
    }
}

/// Fixed-size pool of persistent worker threads pulling tasks from a shared
/// FIFO queue.
///
/// At most `size` tasks execute at any moment, however many are submitted.
/// [`stop_wait`](StandardPool::stop_wait) drains the pool: it refuses new
/// tasks, waits for everything queued or running to finish, then joins the
/// workers.
pub struct StandardPool {
    /// Pool of worker threads.
    worker_threads: Vec<thread::JoinHandle<()>>,
    shared: Arc<PoolShared>,
    size: usize,
}

impl StandardPool {
    /// Creates a new pool with the specified number of worker threads.
    ///
    /// # Panics
    /// Panics if `thread_count` is zero, since such a pool could never run
    /// a task.
    pub fn new(thread_count: usize) -> Self {
        assert!(thread_count > 0, "a worker pool needs at least one thread");

        let mut pool = StandardPool {
            worker_threads: Vec::with_capacity(thread_count),
            shared: Arc::new(PoolShared {
                state: Mutex::new(PoolState::new()),
                task_available: Condvar::new(),
                idle: Condvar::new(),
            }),
            size: thread_count,
        };

        for worker_id in 0..thread_count {
            let shared = pool.shared.clone();
            pool.worker_threads
                .push(thread::spawn(move || worker_loop(worker_id, &shared)));
        }

        tracing::debug!(workers = thread_count, "worker pool started");
        pool
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of tasks queued but not yet picked up by a worker.
    pub fn pending(&self) -> usize {
        lock_recover(&self.shared.state).task_queue.len()
    }

    /// Adds a task to the queue and notifies one waiting worker. Never
    /// waits for a worker to become free.
    pub fn add_task(
        &self,
        task: Arc<dyn Task + Send + Sync>,
    ) -> Result<(), PoolError> {
        let mut state = lock_recover(&self.shared.state);
        if state.shutdown_flag {
            return Err(PoolError::ShutDown);
        }
        state.task_queue.push_back(task);
        self.shared.task_available.notify_one();
        Ok(())
    }

    /// Blocks until every task submitted so far has finished executing. The
    /// pool keeps accepting tasks afterwards.
    pub fn barrier(&self) {
        let mut state = lock_recover(&self.shared.state);
        while !state.is_idle() {
            state = self
                .shared
                .idle
                .wait(state)
                .unwrap_or_else(|e| e.into_inner());
        }
    }

    /// Stops accepting tasks and blocks until every submitted task has
    /// finished and all workers have exited.
    ///
    /// Returns [`PoolError::TaskPanicked`] if any task panicked; the other
    /// tasks still ran to completion.
    pub fn stop_wait(&mut self) -> Result<(), PoolError> {
        {
            let mut state = lock_recover(&self.shared.state);
            state.shutdown_flag = true;
            self.shared.task_available.notify_all();
        }

        for handle in self.worker_threads.drain(..) {
            // Workers catch task panics, so a join error is not expected.
            let _ = handle.join();
        }

        let panicked = {
            let mut state = lock_recover(&self.shared.state);
            std::mem::take(&mut state.panicked)
        };
        tracing::debug!(panicked, "worker pool drained");
        match panicked {
            0 => Ok(()),
            count => Err(PoolError::TaskPanicked { count }),
        }
    }
}

fn worker_loop(worker_id: usize, shared: &PoolShared) {
    loop {
        let task = {
            let mut state = lock_recover(&shared.state);

            // Wait until there is a task to process or a shutdown signal.
            while state.task_queue.is_empty() && !state.shutdown_flag {
                state = shared
                    .task_available
                    .wait(state)
                    .unwrap_or_else(|e| e.into_inner());
            }

            // Queue is empty only on shutdown, and then there is nothing
            // left to drain.
            match state.task_queue.pop_front() {
                Some(task) => {
                    state.in_flight += 1;
                    task
                }
                None => break,
            }
        };

        // Execute the task outside the lock scope.
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| task.execute()));
        drop(task);

        let mut state = lock_recover(&shared.state);
        state.in_flight -= 1;
        if outcome.is_err() {
            state.panicked += 1;
            tracing::error!(worker_id, "task panicked in worker pool");
        }
        if state.is_idle() {
            shared.idle.notify_all();
        }
    }
}

impl Drop for StandardPool {
    /// Drains remaining tasks and joins the workers if `stop_wait` was not
    /// called.
    fn drop(&mut self) {
        if !self.worker_threads.is_empty() {
            let _ = self.stop_wait();
        }
    }
}
