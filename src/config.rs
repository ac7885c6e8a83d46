// SPDX-License-Identifier: MIT

use crate::error::ConfigError;
use crate::source::Die;
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const ROLLS_ENV: &str = "ROLLPOOLS_ROLLS";
pub const POOL_SIZE_ENV: &str = "ROLLPOOLS_POOL_SIZE";
pub const ROLL_LATENCY_ENV: &str = "ROLLPOOLS_ROLL_LATENCY_MS";

/// Parameters of one strategy run, passed explicitly to every strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Number of tasks per run (N).
    rolls: usize,
    /// Worker count of the bounded pool (P).
    pool_size: usize,
    /// Latency of the default [`Die`].
    roll_latency: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            rolls: 100,
            pool_size: 10,
            roll_latency: Duration::from_millis(100),
        }
    }
}

impl RunConfig {
    pub fn new(rolls: usize, pool_size: usize) -> Result<Self, ConfigError> {
        if pool_size == 0 {
            return Err(ConfigError::ZeroPoolSize);
        }
        Ok(RunConfig {
            rolls,
            pool_size,
            ..RunConfig::default()
        })
    }

    /// Starts from the defaults and applies any `ROLLPOOLS_*` environment
    /// overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`from_env`](RunConfig::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let defaults = RunConfig::default();
        let rolls = parse_or(&lookup, ROLLS_ENV, defaults.rolls)?;
        let pool_size = parse_or(&lookup, POOL_SIZE_ENV, defaults.pool_size)?;
        let latency_ms = parse_or(
            &lookup,
            ROLL_LATENCY_ENV,
            defaults.roll_latency.as_millis() as u64,
        )?;

        Ok(RunConfig::new(rolls, pool_size)?
            .with_roll_latency(Duration::from_millis(latency_ms)))
    }

    pub fn with_roll_latency(mut self, roll_latency: Duration) -> Self {
        self.roll_latency = roll_latency;
        self
    }

    pub fn rolls(&self) -> usize {
        self.rolls
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn roll_latency(&self) -> Duration {
        self.roll_latency
    }

    /// A six-sided [`Die`] with the configured latency.
    pub fn die(&self) -> Die {
        Die::new(6, self.roll_latency)
    }
}

fn parse_or<F, T>(
    lookup: &F,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
    }
}
