//! Runs the checkout's build script

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::config::{BOOTSTRAP_ENV, BUILD_SCRIPT, BUILD_SHELL, BuilderConfig};
use crate::error::BuilderError;
use crate::process::{CommandRunner, CommandSpec};

/// Rebuilds the checkout with the bootstrap toolchain
pub struct BuildInvoker {
    config: Arc<BuilderConfig>,
    runner: Arc<dyn CommandRunner>,
}

impl BuildInvoker {
    pub fn new(config: Arc<BuilderConfig>, runner: Arc<dyn CommandRunner>) -> Self {
        Self { config, runner }
    }

    /// The build command: `make.bash` under `<root>/src` with the bootstrap variable set
    pub fn command(&self) -> CommandSpec {
        CommandSpec::new(BUILD_SHELL, self.config.build_dir())
            .arg(BUILD_SCRIPT)
            .env(BOOTSTRAP_ENV, self.config.toolchain.to_string_lossy())
    }

    /// Run the build interactively and wait for it; returns how long it took
    pub async fn build(&self) -> Result<Duration, BuilderError> {
        let spec = self.command();
        debug!(dir = ?spec.current_dir, toolchain = ?self.config.toolchain, "BuildInvoker::build: called");
        let start = Instant::now();

        self.runner.passthrough(&spec).await.map_err(BuilderError::Build)?;

        let elapsed = start.elapsed();
        info!(?elapsed, "Build finished");
        println!("built in {:?}", elapsed);
        Ok(elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CommandError;
    use crate::testing::{BUILD, FakeRunner};
    use std::path::PathBuf;

    fn config() -> Arc<BuilderConfig> {
        Arc::new(BuilderConfig {
            toolchain: PathBuf::from("/opt/go1.4"),
            ..BuilderConfig::with_root("/work/go")
        })
    }

    #[test]
    fn test_build_command() {
        let invoker = BuildInvoker::new(config(), Arc::new(FakeRunner::new()));
        let spec = invoker.command();

        assert_eq!(spec.to_string(), BUILD);
        assert_eq!(spec.current_dir, PathBuf::from("/work/go/src"));
        assert_eq!(spec.env_value("GOROOT_BOOTSTRAP"), Some("/opt/go1.4"));
    }

    #[tokio::test]
    async fn test_build_passes_through() {
        let runner = Arc::new(FakeRunner::new());
        BuildInvoker::new(config(), runner.clone()).build().await.unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert!(!calls[0].captured);
    }

    #[tokio::test]
    async fn test_build_failure() {
        let runner = Arc::new(FakeRunner::new().fail(BUILD, 2));

        let err = BuildInvoker::new(config(), runner).build().await.unwrap_err();
        assert!(matches!(err, BuilderError::Build(CommandError::Failed { code: 2, .. })));
    }
}
