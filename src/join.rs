// SPDX-License-Identifier: MIT

use crate::lock_recover;
use std::sync::{Arc, Condvar, Mutex};

/// Counts outstanding concurrent units and blocks waiters until the count
/// reaches zero.
///
/// Created with the number of units about to be started; each unit calls
/// [`done`](JoinCounter::done) exactly once (or holds a [`JoinGuard`]).
#[derive(Debug)]
pub struct JoinCounter {
    /// Outstanding units and the "reached zero" condition.
    outstanding: Mutex<usize>,
    all_done: Condvar,
}

impl JoinCounter {
    pub fn new(count: usize) -> Self {
        JoinCounter {
            outstanding: Mutex::new(count),
            all_done: Condvar::new(),
        }
    }

    /// Marks one unit as finished.
    pub fn done(&self) {
        let mut outstanding = lock_recover(&self.outstanding);
        if *outstanding == 0 {
            tracing::warn!("join counter signalled more times than it counts");
            return;
        }

        *outstanding -= 1;
        if *outstanding == 0 {
            self.all_done.notify_all();
        }
    }

    /// Blocks until every unit has called `done`.
    pub fn wait(&self) {
        let mut outstanding = lock_recover(&self.outstanding);
        while *outstanding != 0 {
            outstanding = self
                .all_done
                .wait(outstanding)
                .unwrap_or_else(|e| e.into_inner());
        }
    }

    pub fn outstanding(&self) -> usize {
        *lock_recover(&self.outstanding)
    }

    /// Returns a guard that calls `done` when dropped, including while
    /// unwinding from a panic.
    pub fn guard(self: &Arc<Self>) -> JoinGuard {
        JoinGuard {
            counter: Arc::clone(self),
        }
    }
}

/// Signals its [`JoinCounter`] on drop.
#[derive(Debug)]
pub struct JoinGuard {
    counter: Arc<JoinCounter>,
}

impl Drop for JoinGuard {
    fn drop(&mut self) {
        self.counter.done();
    }
}
