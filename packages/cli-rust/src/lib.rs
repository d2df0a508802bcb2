//! dockship CLI - Deploy a Git repository to a remote host
//!
//! This module contains the CLI implementation used by the `dockship` binary.

mod commands;
mod output;
mod wizard;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use clap::error::ErrorKind;
use console::{Term, style};
use dockship_core::{RunLog, Settings, config, expand_tilde, get_version, get_version_long};
use tracing_subscriber::EnvFilter;

/// Deploy a Git repository to a remote host as a Docker container
#[derive(Parser, Debug)]
#[command(name = "dockship")]
#[command(about = "Deploy a Git repository to a remote host as a Docker container", long_about = None)]
#[command(disable_version_flag = true)]
#[command(after_help = get_banner())]
struct Cli {
    /// Remove a previous deployment from the remote host and the local clone
    #[arg(short, long)]
    cleanup: bool,

    /// Print version
    #[arg(short = 'v', long = "version")]
    version: bool,

    /// Settings file to use instead of ~/.config/dockship/config.json
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

/// Get the banner for help display
fn get_banner() -> &'static str {
    r#"
Runs interactively: every parameter is prompted for and validated, and a
summary is shown before anything is changed. Each run writes
deploy_<YYYYMMDDHHMMSS>.log to the current directory.
"#
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(path) => config::load_settings_from(path),
        None => config::load_settings(),
    }
}

/// Create the run log, falling back to console-only output
fn open_run_log(settings: &Settings) -> RunLog {
    let dir = match &settings.log_dir {
        Some(dir) => expand_tilde(dir),
        None => PathBuf::from("."),
    };

    match RunLog::create_in(&dir) {
        Ok(log) => log,
        Err(e) => {
            eprintln!(
                "{} Could not create a log file in {}: {}. Logging to the console only.",
                style("Warning:").yellow().bold(),
                dir.display(),
                e
            );
            RunLog::console()
        }
    }
}

/// Report a command line that could not be parsed
///
/// Help and version requests still exit 0 through clap; usage errors exit 1.
fn parse_failure(e: clap::Error) -> ExitCode {
    match e.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
        _ => {
            let _ = e.print();
            ExitCode::FAILURE
        }
    }
}

/// Record an interruption in the run log, returning the process exit status
fn record_interrupt(log: &RunLog) -> i32 {
    let _ = Term::stdout().show_cursor();
    log.error("Interrupted. Steps already completed are not rolled back");
    1
}

/// Turn SIGINT into a logged error and exit status 1
fn install_interrupt_handler(log: Arc<RunLog>) {
    if let Err(e) = ctrlc::set_handler(move || {
        std::process::exit(record_interrupt(&log));
    }) {
        tracing::warn!("Failed to install the interrupt handler: {}", e);
    }
}

pub fn run() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => return parse_failure(e),
    };

    // Configure color output
    if cli.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    init_tracing();

    if cli.version {
        println!("dockship {}", get_version());
        return ExitCode::SUCCESS;
    }

    let settings = match load_settings(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            let path = cli
                .config
                .clone()
                .or_else(config::get_config_path)
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            eprintln!("{} Configuration error", style("Error:").red().bold());
            eprintln!();
            eprintln!("  {e:#}");
            eprintln!();
            eprintln!("  Settings file: {}", style(path).yellow());
            eprintln!();
            eprintln!(
                "  {} Check the file for syntax errors or unknown fields.",
                style("Tip:").cyan()
            );
            return ExitCode::FAILURE;
        }
    };

    let log = Arc::new(open_run_log(&settings));
    install_interrupt_handler(Arc::clone(&log));
    log.info(format!("dockship {}", get_version_long()));

    let result = if cli.cleanup {
        commands::cmd_cleanup(&settings, &log)
    } else {
        commands::cmd_deploy(&settings, &log)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log.error(format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}
