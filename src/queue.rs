// SPDX-License-Identifier: MIT

//! Result transport between concurrent producers and a single consumer.
//!
//! A queue of capacity 0 is a rendezvous point: every deposit waits for a
//! matching read. A queue of capacity `n` buffers up to `n` results, and
//! costs `n` slots of memory up front.
//!
//! The queue closes once the last [`ResultSender`] is dropped; draining
//! then stops after the remaining buffered results.

use crossbeam_channel::{Receiver, Sender, TrySendError};
use thiserror::Error;

/// Why a deposit did not go through. Carries the undelivered result.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepositError {
    #[error("result queue is full")]
    Full(i64),
    #[error("result queue is closed")]
    Closed(i64),
}

/// Producer half of a result queue. Clone one per producer.
#[derive(Debug, Clone)]
pub struct ResultSender {
    inner: Sender<i64>,
}

/// Consumer half of a result queue.
#[derive(Debug)]
pub struct ResultReceiver {
    inner: Receiver<i64>,
}

/// Creates a result queue holding at most `capacity` undelivered results.
pub fn result_queue(capacity: usize) -> (ResultSender, ResultReceiver) {
    let (tx, rx) = crossbeam_channel::bounded(capacity);
    (ResultSender { inner: tx }, ResultReceiver { inner: rx })
}

impl ResultSender {
    /// Deposits `result`, blocking while the queue has no room (always, for
    /// a rendezvous queue, until a reader arrives).
    pub fn deposit(&self, result: i64) -> Result<(), DepositError> {
        self.inner
            .send(result)
            .map_err(|e| DepositError::Closed(e.into_inner()))
    }

    /// Deposits `result` without ever blocking.
    pub fn try_deposit(&self, result: i64) -> Result<(), DepositError> {
        self.inner.try_send(result).map_err(|e| match e {
            TrySendError::Full(result) => DepositError::Full(result),
            TrySendError::Disconnected(result) => DepositError::Closed(result),
        })
    }
}

impl ResultReceiver {
    /// Blocks for the next result; `None` once the queue is closed and
    /// empty.
    pub fn next_result(&self) -> Option<i64> {
        self.inner.recv().ok()
    }

    /// Reads until the queue is closed.
    pub fn drain(&self) -> impl Iterator<Item = i64> + '_ {
        self.inner.iter()
    }

    /// Reads exactly `count` results, or fewer if the queue closes first.
    pub fn take(&self, count: usize) -> impl Iterator<Item = i64> + '_ {
        self.inner.iter().take(count)
    }

    /// Reads whatever is buffered right now without blocking.
    pub fn drain_buffered(&self) -> impl Iterator<Item = i64> + '_ {
        self.inner.try_iter()
    }

    pub fn buffered(&self) -> usize {
        self.inner.len()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.inner.capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_buffered_queue_accepts_capacity_without_reader() {
        let (tx, rx) = result_queue(8);
        for i in 0..8 {
            assert_eq!(tx.try_deposit(i), Ok(()));
        }
        assert_eq!(tx.try_deposit(8), Err(DepositError::Full(8)));
        assert_eq!(rx.buffered(), 8);

        drop(tx);
        assert_eq!(rx.drain().sum::<i64>(), 28);
    }

    #[test]
    fn test_rendezvous_queue_has_no_room() {
        let (tx, rx) = result_queue(0);
        assert_eq!(rx.capacity(), Some(0));
        assert_eq!(tx.try_deposit(1), Err(DepositError::Full(1)));
    }

    #[test]
    fn test_rendezvous_pairs_producers_with_reader() {
        let (tx, rx) = result_queue(0);
        for i in 1..=10 {
            let tx = tx.clone();
            thread::spawn(move || tx.deposit(i));
        }
        drop(tx);

        assert_eq!(rx.drain().sum::<i64>(), 55);
    }

    #[test]
    fn test_take_stops_when_closed_early() {
        let (tx, rx) = result_queue(4);
        tx.deposit(7).unwrap();
        drop(tx);

        let read: Vec<i64> = rx.take(3).collect();
        assert_eq!(read, vec![7]);
        assert_eq!(rx.next_result(), None);
    }

    #[test]
    fn test_deposit_after_receiver_dropped() {
        let (tx, rx) = result_queue(1);
        drop(rx);
        assert_eq!(tx.deposit(3), Err(DepositError::Closed(3)));
    }
}
