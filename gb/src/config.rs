//! Builder configuration
//!
//! Built once from the command line and shared read-only by every
//! collaborator for the lifetime of the process.

use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;
use eyre::Result;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Default checkout root
pub const DEFAULT_ROOT_DIR: &str = "/src/go";

/// Default bootstrap toolchain
pub const DEFAULT_TOOLCHAIN: &str = "/src/go-linux-amd64-bootstrap/";

/// Default time between cycles
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Environment variable that points the build at the bootstrap toolchain
pub const BOOTSTRAP_ENV: &str = "GOROOT_BOOTSTRAP";

/// Build script, relative to the build directory
pub const BUILD_SCRIPT: &str = "make.bash";

/// Shell used to run the build script
pub const BUILD_SHELL: &str = "/bin/bash";

/// Source control client, resolved from PATH
pub const GIT: &str = "git";

/// What the scheduler does when a cycle runs past one or more ticks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum MissedTicks {
    /// Run once immediately, then stay on the existing tick grid
    #[default]
    Skip,
    /// Run once immediately, then restart the interval from that moment
    Delay,
    /// Run one cycle for every missed tick, back to back
    Burst,
}

impl From<MissedTicks> for MissedTickBehavior {
    fn from(value: MissedTicks) -> Self {
        match value {
            MissedTicks::Skip => MissedTickBehavior::Skip,
            MissedTicks::Delay => MissedTickBehavior::Delay,
            MissedTicks::Burst => MissedTickBehavior::Burst,
        }
    }
}

/// Immutable configuration for the daemon
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderConfig {
    /// Root of the tracked checkout
    pub root_dir: PathBuf,

    /// Prebuilt toolchain used to bootstrap the build
    pub toolchain: PathBuf,

    /// Time between cycles
    pub poll_interval: Duration,

    /// Overrun policy for the scheduler
    pub missed_ticks: MissedTicks,

    /// Stop after this many cycles; `None` runs forever
    pub max_cycles: Option<u64>,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from(DEFAULT_ROOT_DIR),
            toolchain: PathBuf::from(DEFAULT_TOOLCHAIN),
            poll_interval: DEFAULT_POLL_INTERVAL,
            missed_ticks: MissedTicks::default(),
            max_cycles: None,
        }
    }
}

impl BuilderConfig {
    /// Create config for a checkout with defaults for everything else
    pub fn with_root(root_dir: impl Into<PathBuf>) -> Self {
        let root_dir = root_dir.into();
        debug!(?root_dir, "BuilderConfig::with_root: called");
        Self {
            root_dir,
            ..Default::default()
        }
    }

    /// Reject values the scheduler cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(eyre::eyre!("Poll interval must be greater than zero"));
        }
        if self.max_cycles == Some(0) {
            return Err(eyre::eyre!("--max-cycles must be at least 1"));
        }
        Ok(())
    }

    /// The checkout's toolchain binary
    pub fn go_binary(&self) -> PathBuf {
        self.root_dir.join("bin").join("go")
    }

    /// Working directory for the build script
    pub fn build_dir(&self) -> PathBuf {
        self.root_dir.join("src")
    }
}
