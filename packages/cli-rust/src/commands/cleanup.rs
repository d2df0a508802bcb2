//! Cleanup command implementation
//!
//! Removes a deployment from the remote host and the local clone.

use anyhow::{Context, Result};
use dockship_core::{DeployContext, RunLog, Settings, SystemRunner, run_cleanup};

use crate::wizard::{TermPrompter, collect_cleanup_params, verify_local_tools, verify_tty};

/// Tear down a previous deployment
///
/// Remote failures are reported as warnings; the command still succeeds.
pub fn cmd_cleanup(settings: &Settings, log: &RunLog) -> Result<()> {
    let runner = SystemRunner;

    verify_tty()?;
    verify_local_tools(&runner, &["ssh"])?;

    let params = collect_cleanup_params(&TermPrompter, log, settings)?;
    let workdir = std::env::current_dir().context("Failed to determine the working directory")?;
    let ctx = DeployContext::new(&runner, log, settings);

    let report = run_cleanup(&ctx, &params, &workdir);
    if !report.remote_cleaned {
        log.warning(format!(
            "Some remote resources of {} may remain on {}",
            params.project, params.target.host
        ));
    }
    Ok(())
}
