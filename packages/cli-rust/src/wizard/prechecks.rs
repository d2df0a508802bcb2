//! Wizard prechecks
//!
//! Validates the local environment before any prompt is shown.

use anyhow::{Result, bail};
use dockship_core::{CommandRunner, CommandSpec, ExecError};
use std::io::IsTerminal;

/// Local programs every deployment shells out to
pub const REQUIRED_TOOLS: [&str; 3] = ["git", "ssh", "rsync"];

/// Verify TTY is available for interactive prompts
///
/// Returns error with guidance if stdin is not a terminal.
pub fn verify_tty() -> Result<()> {
    if !std::io::stdin().is_terminal() {
        bail!(
            "No TTY detected. dockship asks for its parameters interactively.\n\n\
            Run it from a terminal. Defaults for branch, port, SSH user and key\n\
            can be set in ~/.config/dockship/config.json"
        );
    }
    Ok(())
}

/// Verify the given programs can be started
///
/// Each tool is run with `-V`/`--version`; only a missing binary fails,
/// an unusual exit status does not.
pub fn verify_local_tools(runner: &dyn CommandRunner, tools: &[&str]) -> Result<()> {
    let mut missing = Vec::new();

    for tool in tools {
        let flag = if *tool == "ssh" { "-V" } else { "--version" };
        match runner.run(&CommandSpec::new(*tool).arg(flag)) {
            Ok(_) => {}
            Err(ExecError::NotFound(_)) => missing.push(*tool),
            Err(e) => tracing::debug!("{} check failed: {}", tool, e),
        }
    }

    if !missing.is_empty() {
        bail!(
            "Required tools not found: {}\n\n\
            Install them and make sure they are on PATH, e.g.\n  \
            Debian/Ubuntu: sudo apt-get install git openssh-client rsync\n  \
            macOS:         brew install git rsync",
            missing.join(", ")
        );
    }
    Ok(())
}
