//! gobuilder - Go checkout rebuild daemon
//!
//! CLI entry point: parses flags, sets up logging and runs the scheduler.

use std::fs;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{CommandFactory, FromArgMatches};
use eyre::{Context, Result};
use tracing::{error, info};

use gobuilder::cli::{Cli, generate_after_help, get_log_path};
use gobuilder::error::CommandError;
use gobuilder::process::{CommandRunner, SystemRunner};
use gobuilder::scheduler::Scheduler;
use gobuilder::version::VersionComparator;

/// Exit status after either print flag
const PRINT_EXIT_CODE: u8 = 1;

/// Exit status when configuration, a print flag or a cycle fails
const FATAL_EXIT_CODE: u8 = 255;

fn setup_logging(cli_log_level: Option<&str>) -> Result<()> {
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    let level = match cli_log_level.map(str::to_uppercase).as_deref() {
        Some("TRACE") => tracing::Level::TRACE,
        Some("DEBUG") => tracing::Level::DEBUG,
        Some("INFO") | None => tracing::Level::INFO,
        Some("WARN") | Some("WARNING") => tracing::Level::WARN,
        Some("ERROR") => tracing::Level::ERROR,
        Some(other) => {
            eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", other);
            tracing::Level::INFO
        }
    };

    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .context("Failed to open log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cmd = Cli::command().after_help(generate_after_help());
    let cli = Cli::from_arg_matches(&cmd.get_matches()).unwrap_or_else(|e| e.exit());

    match run(cli).await {
        Ok(code) => code,
        Err(report) => {
            let chain: Vec<String> = report.chain().map(ToString::to_string).collect();
            error!(error = %chain.join(": "), "Fatal error, exiting");
            eprintln!("Error: {:?}", report);
            ExitCode::from(FATAL_EXIT_CODE)
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = cli.to_config().context("Invalid arguments")?;
    let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner);

    // print flags answer before the log file is touched
    if cli.print_executable_path {
        println!("{}", config.go_binary().display());
        return Ok(ExitCode::from(PRINT_EXIT_CODE));
    }
    if cli.print_version {
        let comparator = VersionComparator::new(Arc::new(config), runner);
        print!("{}", comparator.built_version().await?);
        return Ok(ExitCode::from(PRINT_EXIT_CODE));
    }

    setup_logging(cli.log_level.as_deref()).context("Failed to setup logging")?;
    info!(?config, "gobuilder starting");

    let scheduler = Scheduler::new(config, runner);
    let completed = scheduler.run().await.inspect_err(|e| {
        error!(command = ?e.command().map(CommandError::program), error = %e, "Cycle failed");
    })?;
    info!(completed, "gobuilder exiting");
    Ok(ExitCode::SUCCESS)
}
