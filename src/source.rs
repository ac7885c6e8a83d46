// SPDX-License-Identifier: MIT

use rand::Rng;
use std::thread;
use std::time::Duration;

/// Produces one integer per invocation.
///
/// Implementations are invoked from many threads at once without any
/// external locking, which is why `Send + Sync` is part of the contract.
pub trait RollSource: Send + Sync {
    fn roll(&self) -> i64;
}

impl<F> RollSource for F
where
    F: Fn() -> i64 + Send + Sync,
{
    fn roll(&self) -> i64 {
        self()
    }
}

/// A die served by a slow remote service: every roll waits `latency` and
/// then yields a uniform value in `1..=sides`.
#[derive(Debug, Clone)]
pub struct Die {
    sides: i64,
    latency: Duration,
}

impl Die {
    pub fn new(sides: i64, latency: Duration) -> Self {
        Die {
            sides: sides.max(1),
            latency,
        }
    }

    pub fn sides(&self) -> i64 {
        self.sides
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }
}

impl Default for Die {
    fn default() -> Self {
        Die::new(6, Duration::from_millis(100))
    }
}

impl RollSource for Die {
    fn roll(&self) -> i64 {
        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }
        // Thread-local generator, nothing shared between rollers.
        rand::thread_rng().gen_range(1..=self.sides)
    }
}
