// SPDX-License-Identifier: MIT

use rollpools::strategies::{
    bounded_pool, buffered, fan_out, sequential, unbuffered,
};
use rollpools::{run_all, Error, PoolError, RollSource, RunConfig, Strategy};
use std::sync::Arc;
use std::time::Duration;
use test_utils::sources::{
    CountingSource, PanickingSource, ProbeSource, SequenceSource,
};

fn config(rolls: usize, pool_size: usize) -> RunConfig {
    RunConfig::new(rolls, pool_size).unwrap()
}

#[test]
fn test_every_strategy_rolls_exactly_n_times() {
    for rolls in [0, 1, 7, 100, 257] {
        for strategy in Strategy::ALL {
            let source = Arc::new(CountingSource::new(2));
            let report = strategy.run(&source, &config(rolls, 4)).unwrap();

            assert_eq!(source.calls(), rolls, "{}", strategy.name());
            assert_eq!(report.tasks, rolls);
        }
    }
}

#[test]
fn test_sequence_sums_to_5050_everywhere() {
    for strategy in Strategy::ALL {
        let source = Arc::new(SequenceSource::new());
        let report = strategy.run(&source, &config(100, 10)).unwrap();

        assert_eq!(source.calls(), 100);
        if strategy != Strategy::FanOut {
            assert_eq!(report.sum, Some(5050), "{}", strategy.name());
        }
    }
}

#[test]
fn test_run_all_matches_sequential_oracle() {
    let source = Arc::new(CountingSource::new(5));
    let reports = run_all(&source, &config(64, 8)).unwrap();

    let strategies: Vec<_> = reports.iter().map(|r| r.strategy).collect();
    assert_eq!(strategies, Strategy::ALL.to_vec());

    let oracle = reports[0].sum;
    assert_eq!(oracle, Some(320));
    for report in reports.iter().filter(|r| r.sum.is_some()) {
        assert_eq!(report.sum, oracle, "{}", report.strategy.name());
    }
    assert_eq!(source.calls(), 64 * Strategy::ALL.len());
}

#[test]
fn test_zero_rolls_complete_immediately() {
    let config = config(0, 3);
    for strategy in Strategy::ALL {
        let source = Arc::new(CountingSource::new(9));
        let report = strategy.run(&source, &config).unwrap();

        assert_eq!(source.calls(), 0);
        assert!(report.elapsed < Duration::from_secs(1));
        match strategy {
            Strategy::FanOut => assert_eq!(report.sum, None),
            _ => assert_eq!(report.sum, Some(0)),
        }
    }
}

#[test]
fn test_bounded_pool_caps_concurrency() {
    for (rolls, pool_size) in [(40, 1), (40, 4), (3, 8)] {
        let source = Arc::new(ProbeSource::new(Duration::from_millis(2)));
        let report = bounded_pool(&source, &config(rolls, pool_size)).unwrap();

        assert_eq!(report.sum, Some(rolls as i64));
        assert_eq!(report.concurrency_limit, Some(pool_size));
        assert!(source.peak() <= pool_size, "peak {}", source.peak());
        assert_eq!(source.calls(), rolls);
    }
}

#[test]
fn test_unbounded_strategies_exceed_pool_size() {
    let source = Arc::new(ProbeSource::new(Duration::from_millis(50)));
    fan_out(&source, &config(20, 2)).unwrap();
    assert!(source.peak() > 2, "peak {}", source.peak());
}

#[test]
fn test_buffered_deposits_never_block() {
    // Any deposit that would have to wait is rejected as BufferFull.
    let source = Arc::new(CountingSource::new(1));
    let report = buffered(&source, &config(500, 1)).unwrap();
    assert_eq!(report.sum, Some(500));
}

#[test]
fn test_wall_clock_matches_concurrency_shape() {
    let latency = Duration::from_millis(10);
    let config = config(100, 10).with_roll_latency(latency);
    let die = Arc::new(config.die());

    // ceil(100 / 10) rounds of 10ms.
    let pooled = bounded_pool(&die, &config).unwrap();
    assert!(pooled.elapsed >= Duration::from_millis(100));
    assert!(pooled.elapsed < Duration::from_millis(900), "{pooled}");

    let fanned = fan_out(&die, &config).unwrap();
    assert!(fanned.elapsed >= latency);
    assert!(fanned.elapsed < Duration::from_millis(600), "{fanned}");

    let looped = sequential(&*die, &config).unwrap();
    assert!(looped.elapsed >= Duration::from_millis(1000));
}

#[test]
fn test_die_sums_stay_in_range() {
    let config = config(50, 5).with_roll_latency(Duration::ZERO);
    let die = Arc::new(config.die());

    for report in run_all(&die, &config).unwrap() {
        if let Some(sum) = report.sum {
            assert!((50..=300).contains(&sum), "{report}");
        }
    }
}

#[test]
fn test_trait_object_source() {
    let source: Arc<dyn RollSource> = Arc::new(|| 7i64);
    let report = unbuffered(&source, &config(10, 2)).unwrap();
    assert_eq!(report.sum, Some(70));
}

#[test]
fn test_panicking_unit_is_reported_as_lost() {
    let config = config(10, 3);

    let source = Arc::new(PanickingSource::new(3));
    let err = fan_out(&source, &config).unwrap_err();
    assert!(matches!(
        err,
        Error::LostResults {
            expected: 10,
            received: 9
        }
    ));

    let source = Arc::new(PanickingSource::new(3));
    let err = buffered(&source, &config).unwrap_err();
    assert!(matches!(
        err,
        Error::LostResults {
            expected: 10,
            received: 9
        }
    ));

    let source = Arc::new(PanickingSource::new(3));
    let err = unbuffered(&source, &config).unwrap_err();
    assert!(matches!(
        err,
        Error::LostResults {
            expected: 10,
            received: 9
        }
    ));
}

#[test]
fn test_panicking_pool_task_is_reported() {
    let source = Arc::new(PanickingSource::new(5));
    let err = bounded_pool(&source, &config(20, 4)).unwrap_err();

    assert!(matches!(
        err,
        Error::Pool(PoolError::TaskPanicked { count: 1 })
    ));
    // The other tasks still ran.
    assert_eq!(source.calls(), 20);
}
