//! Built-version vs checkout-revision comparison

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::debug;

use crate::config::{BuilderConfig, GIT};
use crate::error::BuilderError;
use crate::process::{CommandRunner, CommandSpec};

/// `go version` output of a toolchain built from a source checkout
static VERSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"go version devel \+(\w+) .+ \w+/\w+").expect("version pattern is valid"));

/// Extract the revision token from `go version` output
///
/// Returns `None` unless the output looks like
/// `go version devel +<hash> <date> <os>/<arch>`.
pub fn parse_version(output: &str) -> Option<&str> {
    let token = VERSION_PATTERN
        .captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str());
    debug!(?token, "parse_version: matched");
    token
}

/// True when the built revision is not the checkout revision
pub fn revisions_differ(built: &str, checkout: &str) -> bool {
    built != checkout
}

/// Decides whether the checkout needs rebuilding
pub struct VersionComparator {
    config: Arc<BuilderConfig>,
    runner: Arc<dyn CommandRunner>,
}

impl VersionComparator {
    pub fn new(config: Arc<BuilderConfig>, runner: Arc<dyn CommandRunner>) -> Self {
        Self { config, runner }
    }

    /// Revision the installed toolchain was built from
    pub async fn built_version(&self) -> Result<String, BuilderError> {
        debug!("VersionComparator::built_version: called");
        let spec = CommandSpec::new(self.config.go_binary(), &self.config.root_dir).arg("version");
        let output = self.runner.capture(&spec).await.map_err(BuilderError::Version)?;

        match parse_version(&output) {
            Some(token) => Ok(token.to_string()),
            None => Err(BuilderError::UnknownVersion {
                output: output.trim_end().to_string(),
            }),
        }
    }

    /// Abbreviated commit the checkout is at
    pub async fn checkout_revision(&self) -> Result<String, BuilderError> {
        debug!("VersionComparator::checkout_revision: called");
        let spec = CommandSpec::new(GIT, &self.config.root_dir).args(["rev-parse", "--short", "HEAD"]);
        let output = self.runner.capture(&spec).await.map_err(BuilderError::Revision)?;
        Ok(output.trim().to_string())
    }

    /// Compare the built revision against the checkout revision
    pub async fn is_update_needed(&self) -> Result<bool, BuilderError> {
        let built = self.built_version().await?;
        let checkout = self.checkout_revision().await?;
        let needed = revisions_differ(&built, &checkout);
        debug!(%built, %checkout, needed, "VersionComparator::is_update_needed: compared");
        Ok(needed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CommandError;
    use crate::testing::{FakeRunner, REV_PARSE};

    const GO_VERSION: &str = "/src/go/bin/go version";
    const DEVEL_OUTPUT: &str = "go version devel +abcdef1 Mon Jan 1 00:00:00 2024 +0000 linux/amd64\n";

    fn comparator(runner: Arc<FakeRunner>) -> VersionComparator {
        VersionComparator::new(Arc::new(BuilderConfig::default()), runner)
    }

    #[test]
    fn test_parse_version_devel() {
        assert_eq!(parse_version(DEVEL_OUTPUT), Some("abcdef1"));
    }

    #[test]
    fn test_parse_version_full_hash() {
        let output = "go version devel +3b7a8c1d2e Tue Feb 6 12:00:00 2024 -0800 darwin/arm64";
        assert_eq!(parse_version(output), Some("3b7a8c1d2e"));
    }

    #[test]
    fn test_parse_version_rejects_release() {
        assert_eq!(parse_version("go version go1.21.0 linux/amd64"), None);
    }

    #[test]
    fn test_parse_version_rejects_missing_platform() {
        assert_eq!(parse_version("go version devel +abcdef1"), None);
        assert_eq!(parse_version(""), None);
    }

    #[test]
    fn test_revisions_differ() {
        assert!(revisions_differ("abcdef1", "1234567"));
        assert!(!revisions_differ("abcdef1", "abcdef1"));
        assert!(revisions_differ("abcdef1", "abcdef10"));
    }

    #[tokio::test]
    async fn test_up_to_date() {
        let runner = Arc::new(FakeRunner::new().reply(GO_VERSION, DEVEL_OUTPUT).reply(REV_PARSE, "abcdef1\n"));

        assert!(!comparator(runner.clone()).is_update_needed().await.unwrap());
        assert_eq!(runner.lines(), vec![GO_VERSION, REV_PARSE]);
        assert!(runner.calls().iter().all(|c| c.captured));
    }

    #[tokio::test]
    async fn test_stale() {
        let runner = Arc::new(FakeRunner::new().reply(GO_VERSION, DEVEL_OUTPUT).reply(REV_PARSE, "1234567\n"));

        assert!(comparator(runner).is_update_needed().await.unwrap());
    }

    #[tokio::test]
    async fn test_commands_run_in_checkout() {
        let runner = Arc::new(FakeRunner::new().reply(GO_VERSION, DEVEL_OUTPUT).reply(REV_PARSE, "abcdef1"));
        comparator(runner.clone()).is_update_needed().await.unwrap();

        for call in runner.calls() {
            assert_eq!(call.spec.current_dir, std::path::PathBuf::from("/src/go"));
        }
    }

    #[tokio::test]
    async fn test_unknown_version_is_error() {
        let runner = Arc::new(
            FakeRunner::new()
                .reply(GO_VERSION, "go version go1.21.0 linux/amd64\n")
                .reply(REV_PARSE, "abcdef1"),
        );

        let err = comparator(runner.clone()).is_update_needed().await.unwrap_err();
        assert!(matches!(err, BuilderError::UnknownVersion { ref output } if output == "go version go1.21.0 linux/amd64"));
        assert_eq!(runner.count(REV_PARSE), 0);
    }

    #[tokio::test]
    async fn test_version_command_failure() {
        let runner = Arc::new(FakeRunner::new().fail(GO_VERSION, 2));

        let err = comparator(runner).built_version().await.unwrap_err();
        assert!(matches!(err, BuilderError::Version(CommandError::Failed { code: 2, .. })));
    }

    #[tokio::test]
    async fn test_revision_command_failure() {
        let runner = Arc::new(FakeRunner::new().reply(GO_VERSION, DEVEL_OUTPUT).fail(REV_PARSE, 128));

        let err = comparator(runner).is_update_needed().await.unwrap_err();
        assert!(matches!(err, BuilderError::Revision(CommandError::Failed { code: 128, .. })));
    }
}
