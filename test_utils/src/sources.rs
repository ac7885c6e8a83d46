// SPDX-License-Identifier: MIT

//! Instrumented roll sources for exercising the strategies.

use rollpools::RollSource;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering::SeqCst};
use std::thread;
use std::time::Duration;

/// Source that counts its invocations and always returns the same value.
pub struct CountingSource {
    /// Number of completed `roll` calls.
    calls: AtomicUsize,
    value: i64,
}

impl CountingSource {
    pub fn new(value: i64) -> Self {
        CountingSource {
            calls: AtomicUsize::new(0),
            value,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(SeqCst)
    }
}

impl RollSource for CountingSource {
    fn roll(&self) -> i64 {
        self.calls.fetch_add(1, SeqCst);
        self.value
    }
}

/// Source yielding 1, 2, 3, ... in invocation order.
pub struct SequenceSource {
    next: AtomicI64,
}

impl SequenceSource {
    pub fn new() -> Self {
        SequenceSource {
            next: AtomicI64::new(1),
        }
    }

    pub fn calls(&self) -> usize {
        (self.next.load(SeqCst) - 1) as usize
    }
}

impl Default for SequenceSource {
    fn default() -> Self {
        Self::new()
    }
}

impl RollSource for SequenceSource {
    fn roll(&self) -> i64 {
        self.next.fetch_add(1, SeqCst)
    }
}

/// Source that sleeps on every roll and records how many rolls were in
/// flight at the same time.
pub struct ProbeSource {
    latency: Duration,
    /// Rolls currently sleeping.
    current: AtomicUsize,
    /// Highest value `current` ever reached.
    peak: AtomicUsize,
    calls: AtomicUsize,
}

impl ProbeSource {
    pub fn new(latency: Duration) -> Self {
        ProbeSource {
            latency,
            current: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn peak(&self) -> usize {
        self.peak.load(SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(SeqCst)
    }
}

impl RollSource for ProbeSource {
    fn roll(&self) -> i64 {
        let in_flight = self.current.fetch_add(1, SeqCst) + 1;
        self.peak.fetch_max(in_flight, SeqCst);

        thread::sleep(self.latency);

        self.current.fetch_sub(1, SeqCst);
        self.calls.fetch_add(1, SeqCst);
        1
    }
}

/// Source that panics on its `panic_on`-th call (1-based) and returns 1
/// otherwise.
pub struct PanickingSource {
    calls: AtomicUsize,
    panic_on: usize,
}

impl PanickingSource {
    pub fn new(panic_on: usize) -> Self {
        PanickingSource {
            calls: AtomicUsize::new(0),
            panic_on,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(SeqCst)
    }
}

impl RollSource for PanickingSource {
    fn roll(&self) -> i64 {
        let call = self.calls.fetch_add(1, SeqCst) + 1;
        if call == self.panic_on {
            panic!("roll {call} failed");
        }
        1
    }
}
