//! CLI argument definitions

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use eyre::{Context, Result};
use tracing::debug;

use crate::config::{BUILD_SHELL, BuilderConfig, DEFAULT_ROOT_DIR, DEFAULT_TOOLCHAIN, GIT, MissedTicks};

/// gobuilder - keeps a Go checkout pulled and rebuilt
#[derive(Debug, Parser)]
#[command(
    name = "gobuilder",
    about = "Polls a Go source checkout and rebuilds it when upstream moves",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// Print the installed toolchain's revision and exit
    #[arg(short = 'v', long = "print-version", conflicts_with = "print_executable_path")]
    pub print_version: bool,

    /// Print the path of the checkout's go executable and exit
    #[arg(short = 'p', long = "print-executable-path")]
    pub print_executable_path: bool,

    /// Go root directory (the tracked checkout)
    #[arg(short = 'r', long = "root", default_value = DEFAULT_ROOT_DIR)]
    pub root: PathBuf,

    /// Bootstrap toolchain used to build the checkout
    #[arg(short = 'c', long = "toolchain", default_value = DEFAULT_TOOLCHAIN)]
    pub toolchain: PathBuf,

    /// Time to wait between updates (e.g. 30s, 5m)
    #[arg(short = 't', long = "interval", default_value = "30s", value_parser = humantime::parse_duration)]
    pub interval: Duration,

    /// What to do with ticks missed while a cycle overran the interval
    #[arg(long = "missed-ticks", value_enum, default_value_t = MissedTicks::Skip)]
    pub missed_ticks: MissedTicks,

    /// Exit after this many cycles instead of running forever
    #[arg(long = "max-cycles")]
    pub max_cycles: Option<u64>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,
}

impl Cli {
    /// Build the validated, immutable configuration for the daemon
    pub fn to_config(&self) -> Result<BuilderConfig> {
        debug!(root = ?self.root, toolchain = ?self.toolchain, "Cli::to_config: called");
        let root_dir = std::path::absolute(&self.root)
            .context(format!("Failed to resolve root directory {}", self.root.display()))?;

        let config = BuilderConfig {
            root_dir,
            toolchain: self.toolchain.clone(),
            poll_interval: self.interval,
            missed_ticks: self.missed_ticks,
            max_cycles: self.max_cycles,
        };
        config.validate()?;
        Ok(config)
    }
}

/// An external command the cycle shells out to, and what `--version` reported
#[derive(Debug)]
pub struct RequiredTool {
    pub program: String,
    pub version: Option<String>,
}

impl RequiredTool {
    /// Run `program --version`; a launch failure or non-zero exit leaves `version` unset
    pub fn detect(program: &str) -> Self {
        debug!(program, "RequiredTool::detect: called");
        let version = std::process::Command::new(program)
            .arg("--version")
            .output()
            .ok()
            .filter(|output| output.status.success())
            .map(|output| first_version_number(&String::from_utf8_lossy(&output.stdout)));
        Self {
            program: program.to_string(),
            version,
        }
    }

    pub fn is_available(&self) -> bool {
        self.version.is_some()
    }
}

/// First dotted number in a tool's `--version` output
fn first_version_number(output: &str) -> String {
    output
        .split_whitespace()
        .map(|word| word.trim_start_matches('v'))
        .filter(|word| word.starts_with(|c: char| c.is_ascii_digit()))
        .map(|word| word.chars().take_while(|c| c.is_ascii_digit() || *c == '.').collect::<String>())
        .find(|version| !version.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

/// The source control client and the build shell, as every cycle invokes them
pub fn required_tools() -> Vec<RequiredTool> {
    [GIT, BUILD_SHELL].into_iter().map(RequiredTool::detect).collect()
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("gobuilder")
        .join("logs")
        .join("gobuilder.log")
}

/// Generate the after_help text with tool checks and the log location
pub fn generate_after_help() -> String {
    let mut help = String::from("Required Tools:\n");
    for tool in required_tools() {
        let icon = if tool.is_available() { "\u{2705}" } else { "\u{274C}" };
        let version = tool.version.as_deref().unwrap_or("not found");
        help.push_str(&format!("  {} {:<10} {}\n", icon, tool.program, version));
    }

    help.push('\n');
    help.push_str(&format!("Logs are written to: {}\n", get_log_path().display()));
    help
}
