//! Drives the sync/compare/build cycle on a fixed interval
//!
//! The first cycle runs as soon as the scheduler starts. The interval timer is
//! armed only after it finishes, and each later cycle is awaited before the
//! timer is polled again, so cycles never overlap. What happens to ticks that
//! fall due while a cycle is still running is decided by
//! [`MissedTicks`](crate::config::MissedTicks).

use std::sync::Arc;

use tokio::time::{Instant, interval_at};
use tracing::{debug, info};

use crate::builder::BuildInvoker;
use crate::config::BuilderConfig;
use crate::error::BuilderError;
use crate::process::CommandRunner;
use crate::sync::Synchronizer;
use crate::version::VersionComparator;

/// How a completed cycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Checkout revision matched the built toolchain; nothing was built
    UpToDate,
    /// Revisions differed and the build succeeded
    Rebuilt,
}

/// Owns the collaborators and runs them in sequence
pub struct Scheduler {
    config: Arc<BuilderConfig>,
    synchronizer: Synchronizer,
    comparator: VersionComparator,
    builder: BuildInvoker,
}

impl Scheduler {
    pub fn new(config: BuilderConfig, runner: Arc<dyn CommandRunner>) -> Self {
        debug!(?config, "Scheduler::new: called");
        let config = Arc::new(config);
        Self {
            synchronizer: Synchronizer::new(config.clone(), runner.clone()),
            comparator: VersionComparator::new(config.clone(), runner.clone()),
            builder: BuildInvoker::new(config.clone(), runner),
            config,
        }
    }

    /// One cycle: pull, compare, and build only if the checkout moved
    pub async fn run_cycle(&self) -> Result<CycleOutcome, BuilderError> {
        debug!("Scheduler::run_cycle: called");
        self.synchronizer.sync().await?;

        if !self.comparator.is_update_needed().await? {
            info!("No update needed");
            println!("no update needed");
            return Ok(CycleOutcome::UpToDate);
        }

        self.builder.build().await?;
        Ok(CycleOutcome::Rebuilt)
    }

    /// Run cycles until one fails or the configured cycle limit is reached
    ///
    /// Without a cycle limit this only returns on error. Returns the number of
    /// cycles completed.
    pub async fn run(&self) -> Result<u64, BuilderError> {
        let period = self.config.poll_interval;
        info!(interval = ?period, root = ?self.config.root_dir, "Scheduler started");
        println!("started go builder with rate of {}", humantime::format_duration(period));

        // first run not on the timer
        let mut completed = 0;
        self.run_cycle().await?;
        completed += 1;

        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(self.config.missed_ticks.into());

        while !self.limit_reached(completed) {
            ticker.tick().await;
            let outcome = self.run_cycle().await?;
            completed += 1;
            debug!(?outcome, completed, "Scheduler::run: cycle finished");
        }

        info!(completed, "Cycle limit reached");
        Ok(completed)
    }

    fn limit_reached(&self, completed: u64) -> bool {
        self.config.max_cycles.is_some_and(|max| completed >= max)
    }
}
