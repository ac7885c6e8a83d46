// SPDX-License-Identifier: MIT

use crate::strategies::Strategy;
use std::fmt;
use std::time::Duration;

/// Outcome of one strategy run: how long it took and what it summed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    pub strategy: Strategy,
    pub elapsed: Duration,
    /// Number of tasks run (N).
    pub tasks: usize,
    /// `None` for strategies that discard results.
    pub sum: Option<i64>,
    /// Worker count, for the bounded pool only.
    pub concurrency_limit: Option<usize>,
}

impl fmt::Display for ExecutionReport {
    /// Renders the report as a single line, e.g. `Took 1.01s to sum 100
    /// dice rolls using a bounded worker pool and a concurrency limit of
    /// 10. Sum is 352`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = if self.sum.is_some() { "sum" } else { "do" };
        write!(
            f,
            "Took {:?} to {} {} dice rolls using {}",
            self.elapsed,
            verb,
            self.tasks,
            self.strategy.description()
        )?;
        if let Some(limit) = self.concurrency_limit {
            write!(f, " and a concurrency limit of {}", limit)?;
        }
        if let Some(sum) = self.sum {
            write!(f, ". Sum is {}", sum)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_sum_and_limit() {
        let report = ExecutionReport {
            strategy: Strategy::BoundedPool,
            elapsed: Duration::from_millis(1500),
            tasks: 100,
            sum: Some(350),
            concurrency_limit: Some(10),
        };
        assert_eq!(
            report.to_string(),
            "Took 1.5s to sum 100 dice rolls using a bounded worker pool \
             and a concurrency limit of 10. Sum is 350"
        );
    }

    #[test]
    fn test_display_without_sum() {
        let report = ExecutionReport {
            strategy: Strategy::FanOut,
            elapsed: Duration::from_millis(100),
            tasks: 100,
            sum: None,
            concurrency_limit: None,
        };
        assert_eq!(
            report.to_string(),
            "Took 100ms to do 100 dice rolls using a join counter"
        );
    }
}
