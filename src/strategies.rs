// SPDX-License-Identifier: MIT

//! The concurrency strategies. Each runs `config.rolls()` invocations of a
//! [`RollSource`] and reports the elapsed time and, except for
//! [`fan_out`], the sum of the results.
//!
//! Every concurrent strategy checks that it received one result per task.
//! A unit that panics is reported as [`Error::LostResults`] (or as a pool
//! error for [`bounded_pool`]) instead of producing a partial sum. Nothing
//! is retried.

use crate::config::RunConfig;
use crate::error::{Error, Result};
use crate::join::JoinCounter;
use crate::pools::standardpool::{StandardPool, Task};
use crate::queue::{result_queue, DepositError, ResultSender};
use crate::report::ExecutionReport;
use crate::source::RollSource;
use std::panic;
use std::sync::atomic::{AtomicUsize, Ordering::SeqCst};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    Sequential,
    FanOut,
    Buffered,
    Unbuffered,
    BoundedPool,
}

impl Strategy {
    /// All strategies, in the order [`run_all`] runs them.
    pub const ALL: [Strategy; 5] = [
        Strategy::Sequential,
        Strategy::FanOut,
        Strategy::Buffered,
        Strategy::Unbuffered,
        Strategy::BoundedPool,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Strategy::Sequential => "sequential",
            Strategy::FanOut => "fan-out",
            Strategy::Buffered => "buffered",
            Strategy::Unbuffered => "unbuffered",
            Strategy::BoundedPool => "bounded-pool",
        }
    }

    /// Phrase used in the one-line report.
    pub fn description(self) -> &'static str {
        match self {
            Strategy::Sequential => "a naive loop",
            Strategy::FanOut => "a join counter",
            Strategy::Buffered => "a buffered queue",
            Strategy::Unbuffered => "an unbuffered queue",
            Strategy::BoundedPool => "a bounded worker pool",
        }
    }

    pub fn run<S>(
        self,
        source: &Arc<S>,
        config: &RunConfig,
    ) -> Result<ExecutionReport>
    where
        S: RollSource + ?Sized + 'static,
    {
        match self {
            Strategy::Sequential => sequential(&**source, config),
            Strategy::FanOut => fan_out(source, config),
            Strategy::Buffered => buffered(source, config),
            Strategy::Unbuffered => unbuffered(source, config),
            Strategy::BoundedPool => bounded_pool(source, config),
        }
    }
}

/// Runs every strategy in turn against the same source and configuration.
pub fn run_all<S>(
    source: &Arc<S>,
    config: &RunConfig,
) -> Result<Vec<ExecutionReport>>
where
    S: RollSource + ?Sized + 'static,
{
    Strategy::ALL
        .iter()
        .map(|strategy| strategy.run(source, config))
        .collect()
}

/// Rolls one after another on the calling thread. A panicking roll
/// propagates to the caller.
pub fn sequential<S>(
    source: &S,
    config: &RunConfig,
) -> Result<ExecutionReport>
where
    S: RollSource + ?Sized,
{
    let rolls = config.rolls();
    tracing::debug!(rolls, "starting sequential run");

    let start = Instant::now();
    let mut sum = 0i64;
    for _ in 0..rolls {
        sum += source.roll();
    }

    Ok(finish(Strategy::Sequential, start, rolls, Some(sum), None))
}

/// Starts one thread per roll and waits on a [`JoinCounter`]; results are
/// discarded. Thread count grows with N without bound.
pub fn fan_out<S>(
    source: &Arc<S>,
    config: &RunConfig,
) -> Result<ExecutionReport>
where
    S: RollSource + ?Sized + 'static,
{
    let rolls = config.rolls();
    tracing::debug!(rolls, "starting fan-out run");

    let start = Instant::now();
    let counter = Arc::new(JoinCounter::new(rolls));
    let completed = Arc::new(AtomicUsize::new(0));

    for _ in 0..rolls {
        let done = counter.guard();
        let source = source.clone();
        let completed = completed.clone();
        thread::spawn(move || {
            let _done = done;
            source.roll();
            completed.fetch_add(1, SeqCst);
        });
    }
    counter.wait();

    check_received(rolls, completed.load(SeqCst))?;
    Ok(finish(Strategy::FanOut, start, rolls, None, None))
}

/// Starts one thread per roll, each depositing into a queue with room for
/// all N results, then drains the queue once every thread is done.
///
/// Deposits never block because the buffer holds N results, which costs N
/// slots of memory for the duration of the run.
pub fn buffered<S>(
    source: &Arc<S>,
    config: &RunConfig,
) -> Result<ExecutionReport>
where
    S: RollSource + ?Sized + 'static,
{
    let rolls = config.rolls();
    tracing::debug!(rolls, "starting buffered run");

    let start = Instant::now();
    let (results, receiver) = result_queue(rolls);
    let counter = Arc::new(JoinCounter::new(rolls));
    let rejected = Arc::new(AtomicUsize::new(0));

    for _ in 0..rolls {
        let done = counter.guard();
        let source = source.clone();
        let results = results.clone();
        let rejected = rejected.clone();
        thread::spawn(move || {
            let _done = done;
            if let Err(err) = results.try_deposit(source.roll()) {
                tracing::warn!(%err, "buffered deposit rejected");
                rejected.fetch_add(1, SeqCst);
            }
        });
    }

    counter.wait();
    drop(results);

    let rejected = rejected.load(SeqCst);
    if rejected > 0 {
        return Err(Error::BufferFull {
            capacity: rolls,
            rejected,
        });
    }

    // Every deposit happened before its unit signalled the counter.
    let (received, sum) = sum_counted(receiver.drain_buffered());
    check_received(rolls, received)?;
    Ok(finish(Strategy::Buffered, start, rolls, Some(sum), None))
}

/// Fans N producer threads into a rendezvous queue while the caller reads
/// exactly N results as they arrive.
///
/// A supervisor thread starts the producers so the caller can begin
/// reading immediately.
pub fn unbuffered<S>(
    source: &Arc<S>,
    config: &RunConfig,
) -> Result<ExecutionReport>
where
    S: RollSource + ?Sized + 'static,
{
    let rolls = config.rolls();
    tracing::debug!(rolls, "starting unbuffered run");

    let start = Instant::now();
    let (results, receiver) = result_queue(0);

    let source = source.clone();
    thread::spawn(move || {
        for _ in 0..rolls {
            let source = source.clone();
            let results = results.clone();
            thread::spawn(move || {
                if let Err(err) = results.deposit(source.roll()) {
                    tracing::warn!(%err, "unbuffered deposit failed");
                }
            });
        }
    });

    // Stops early only if every producer is gone, i.e. some of them died.
    let (received, sum) = sum_counted(receiver.take(rolls));
    drop(receiver);

    check_received(rolls, received)?;
    Ok(finish(Strategy::Unbuffered, start, rolls, Some(sum), None))
}

/// Submits N roll tasks to a pool of `config.pool_size()` workers that
/// deposit into a rendezvous queue; at most P rolls are ever in flight.
///
/// A supervisor thread drains the pool with [`StandardPool::stop_wait`],
/// after which the last task, and with it the last sender, is gone and the
/// caller's read loop ends.
pub fn bounded_pool<S>(
    source: &Arc<S>,
    config: &RunConfig,
) -> Result<ExecutionReport>
where
    S: RollSource + ?Sized + 'static,
{
    let rolls = config.rolls();
    let pool_size = config.pool_size();
    tracing::debug!(rolls, pool_size, "starting bounded-pool run");

    let start = Instant::now();
    let mut pool = StandardPool::new(pool_size);
    let (results, receiver) = result_queue(0);

    for _ in 0..rolls {
        pool.add_task(Arc::new(RollTask {
            source: source.clone(),
            results: results.clone(),
        }))?;
    }
    drop(results);

    let supervisor = thread::spawn(move || pool.stop_wait());

    let (received, sum) = sum_counted(receiver.drain());
    match supervisor.join() {
        Ok(drained) => drained?,
        Err(payload) => panic::resume_unwind(payload),
    }

    check_received(rolls, received)?;
    Ok(finish(
        Strategy::BoundedPool,
        start,
        rolls,
        Some(sum),
        Some(pool_size),
    ))
}

/// Pool task performing one roll and depositing its result.
struct RollTask<S: ?Sized> {
    source: Arc<S>,
    results: ResultSender,
}

impl<S> Task for RollTask<S>
where
    S: RollSource + ?Sized,
{
    fn execute(&self) {
        match self.results.deposit(self.source.roll()) {
            Ok(()) => {}
            Err(DepositError::Closed(result) | DepositError::Full(result)) => {
                tracing::warn!(result, "result queue closed, roll dropped");
            }
        }
    }
}

fn sum_counted(results: impl Iterator<Item = i64>) -> (usize, i64) {
    results.fold((0, 0), |(count, sum), result| (count + 1, sum + result))
}

fn check_received(expected: usize, received: usize) -> Result<()> {
    if received != expected {
        tracing::error!(expected, received, "results lost");
        return Err(Error::LostResults { expected, received });
    }
    Ok(())
}

fn finish(
    strategy: Strategy,
    start: Instant,
    tasks: usize,
    sum: Option<i64>,
    concurrency_limit: Option<usize>,
) -> ExecutionReport {
    let elapsed = start.elapsed();
    tracing::info!(
        strategy = strategy.name(),
        ?elapsed,
        tasks,
        ?sum,
        "strategy finished"
    );
    ExecutionReport {
        strategy,
        elapsed,
        tasks,
        sum,
        concurrency_limit,
    }
}
