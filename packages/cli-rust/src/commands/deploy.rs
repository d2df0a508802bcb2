//! Deploy command implementation
//!
//! Collects the parameters interactively and runs the full deployment.

use std::io::IsTerminal;

use anyhow::{Context, Result};
use dockship_core::{DeployContext, RunLog, Settings, SystemRunner, run_deployment};

use crate::output::SpinnerProgress;
use crate::wizard::{
    REQUIRED_TOOLS, TermPrompter, collect_deploy_params, display_report, verify_local_tools,
    verify_tty,
};

/// Deploy a repository to a remote host
///
/// This command:
/// 1. Checks for a terminal and the local git, ssh and rsync
/// 2. Prompts for and validates every parameter, then asks for confirmation
/// 3. Stages the repository in the current directory
/// 4. Checks SSH, provisions the host, deploys and runs diagnostics
///
/// Declining the confirmation is not an error.
pub fn cmd_deploy(settings: &Settings, log: &RunLog) -> Result<()> {
    let runner = SystemRunner;

    verify_tty()?;
    verify_local_tools(&runner, &REQUIRED_TOOLS)?;

    let Some(params) = collect_deploy_params(&TermPrompter, log, settings)? else {
        return Ok(());
    };

    let workdir = std::env::current_dir().context("Failed to determine the working directory")?;
    let progress = SpinnerProgress::new(!std::io::stdout().is_terminal());
    let ctx = DeployContext::new(&runner, log, settings).with_progress(&progress);

    let report = run_deployment(&ctx, &params, &workdir)?;
    display_report(&report);

    if let Some(path) = log.path() {
        println!("Log written to {}", path.display());
    }
    Ok(())
}
