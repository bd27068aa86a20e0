//! External command execution
//!
//! Every collaborator in the cycle talks to the outside world by running a
//! command. [`CommandRunner`] is the seam: the daemon uses [`SystemRunner`],
//! tests substitute their own runner and feed canned output.

use std::fmt;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::CommandError;

/// A command to run: program, arguments, working directory and extra environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub current_dir: PathBuf,
    /// Appended to the inherited environment
    pub envs: Vec<(String, String)>,
}

impl CommandSpec {
    /// Create a spec for `program` running in `current_dir`
    pub fn new(program: impl Into<PathBuf>, current_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: current_dir.into(),
            envs: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Look up an extra environment entry by name
    pub fn env_value(&self, key: &str) -> Option<&str> {
        self.envs.iter().rev().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .current_dir(&self.current_dir)
            .envs(self.envs.iter().map(|(k, v)| (k, v)));
        cmd
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Runs external commands on behalf of the cycle collaborators
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run to completion and return stdout; stderr goes to our stderr
    async fn capture(&self, spec: &CommandSpec) -> Result<String, CommandError>;

    /// Run with stdin, stdout and stderr connected to ours, then wait for exit
    async fn passthrough(&self, spec: &CommandSpec) -> Result<(), CommandError>;
}

/// [`CommandRunner`] backed by real child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn capture(&self, spec: &CommandSpec) -> Result<String, CommandError> {
        debug!(%spec, dir = ?spec.current_dir, "SystemRunner::capture: called");
        let output = spec
            .command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .output()
            .await
            .map_err(|source| CommandError::Launch {
                program: spec.to_string(),
                source,
            })?;

        check_status(spec, output.status)?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!(stdout_len = stdout.len(), "SystemRunner::capture: command succeeded");
        Ok(stdout)
    }

    async fn passthrough(&self, spec: &CommandSpec) -> Result<(), CommandError> {
        debug!(%spec, dir = ?spec.current_dir, "SystemRunner::passthrough: called");
        let mut child = spec
            .command()
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| CommandError::Launch {
                program: spec.to_string(),
                source,
            })?;

        let status = child.wait().await.map_err(|source| CommandError::Wait {
            program: spec.to_string(),
            source,
        })?;

        check_status(spec, status)?;
        debug!("SystemRunner::passthrough: command succeeded");
        Ok(())
    }
}

fn check_status(spec: &CommandSpec, status: ExitStatus) -> Result<(), CommandError> {
    if status.success() {
        return Ok(());
    }
    match status.code() {
        Some(code) => {
            debug!(%spec, code, "check_status: non-zero exit");
            Err(CommandError::Failed {
                program: spec.to_string(),
                code,
            })
        }
        None => {
            debug!(%spec, "check_status: no exit code, killed by signal");
            Err(CommandError::Interrupted {
                program: spec.to_string(),
            })
        }
    }
}
