// SPDX-License-Identifier: MIT

//! Runs a fixed number of independent roll tasks under several concurrency
//! strategies and sums their results.
//!
//! Each strategy in [`strategies`] drives the same [`RollSource`] through a
//! different synchronization mechanism: a plain loop, a [`JoinCounter`]
//! fan-out, a buffered or rendezvous [`queue`], or a bounded
//! [`StandardPool`]. All of them hand back an [`ExecutionReport`].

use std::sync::{Mutex, MutexGuard};

pub mod config;
pub mod error;
pub mod join;
pub mod pools;
pub mod queue;
pub mod report;
pub mod source;
pub mod strategies;

pub use config::RunConfig;
pub use error::{ConfigError, Error, PoolError, Result};
pub use join::{JoinCounter, JoinGuard};
pub use pools::standardpool;
pub use pools::standardpool::{StandardPool, Task};
pub use report::ExecutionReport;
pub use source::{Die, RollSource};
pub use strategies::{run_all, Strategy};

/// Locks `mutex`, recovering the guard if a previous holder panicked.
///
/// None of the state guarded in this crate can be left half-updated by a
/// panic, so poisoning is cleared instead of propagated.
pub(crate) fn lock_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            mutex.clear_poison();
            poisoned.into_inner()
        }
    }
}
