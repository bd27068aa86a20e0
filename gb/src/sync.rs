//! Pulls upstream changes into the checkout

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::config::{BuilderConfig, GIT};
use crate::error::BuilderError;
use crate::process::{CommandRunner, CommandSpec};

/// Runs `git pull` in the checkout
pub struct Synchronizer {
    config: Arc<BuilderConfig>,
    runner: Arc<dyn CommandRunner>,
}

impl Synchronizer {
    pub fn new(config: Arc<BuilderConfig>, runner: Arc<dyn CommandRunner>) -> Self {
        Self { config, runner }
    }

    /// Pull with output passed through; returns how long it took
    pub async fn sync(&self) -> Result<Duration, BuilderError> {
        debug!(root = ?self.config.root_dir, "Synchronizer::sync: called");
        let start = Instant::now();

        let spec = CommandSpec::new(GIT, &self.config.root_dir).arg("pull");
        self.runner.passthrough(&spec).await.map_err(BuilderError::Sync)?;

        let elapsed = start.elapsed();
        info!(?elapsed, "Checkout updated");
        println!("updated ({:?})", elapsed);
        Ok(elapsed)
    }
}
