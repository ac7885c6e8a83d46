// SPDX-License-Identifier: MIT

use rollpools::{run_all, RunConfig};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = RunConfig::from_env()?;
    tracing::info!(
        rolls = config.rolls(),
        pool_size = config.pool_size(),
        roll_latency = ?config.roll_latency(),
        "running every strategy"
    );

    let die = Arc::new(config.die());
    for report in run_all(&die, &config)? {
        println!("{report}");
    }

    Ok(())
}
