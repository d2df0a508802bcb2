//! Interactive parameter collection
//!
//! Asks for every deployment parameter in turn, re-prompting until each
//! answer is valid, then shows a summary and asks for confirmation.

mod prechecks;
mod prompt;
mod summary;

pub use prechecks::{REQUIRED_TOOLS, verify_local_tools, verify_tty};
pub use prompt::{Prompter, TermPrompter};
pub use summary::{display_report, display_summary};

use anyhow::Result;
use console::style;
use dockship_core::params::ParamsError;
use dockship_core::validate::{
    is_valid_branch_name, is_valid_ipv4_syntax, is_valid_repo_url, is_valid_ssh_user, parse_port,
};
use dockship_core::{
    CleanupParams, DeployInput, DeployParams, ProjectName, RunLog, Settings, expand_tilde,
};

use prompt::prompt_validated;

fn validate_repo_url(url: &str) -> Result<String, String> {
    if !is_valid_repo_url(url) {
        return Err(format!(
            "Invalid repository URL: {url}. Expected https://<host>/<path>.git"
        ));
    }
    ProjectName::from_repo_url(url).map_err(|e| e.to_string())?;
    Ok(url.to_string())
}

fn validate_ssh_user(user: &str) -> Result<String, String> {
    if is_valid_ssh_user(user) {
        Ok(user.to_string())
    } else {
        Err(format!(
            "Invalid SSH username: {user}. Use letters, digits, '.', '_' and '-'"
        ))
    }
}

fn validate_branch(branch: &str) -> Result<String, String> {
    if is_valid_branch_name(branch) {
        Ok(branch.to_string())
    } else {
        Err(format!("Invalid branch name: {branch}"))
    }
}

fn validate_host(host: &str) -> Result<String, String> {
    if is_valid_ipv4_syntax(host) {
        Ok(host.to_string())
    } else {
        Err(format!(
            "Invalid server address: {host}. Expected an IPv4 address like 192.0.2.10"
        ))
    }
}

fn validate_key_path(path: &str) -> Result<String, String> {
    let expanded = expand_tilde(path);
    if expanded.is_file() {
        Ok(path.to_string())
    } else {
        Err(format!("SSH key not found: {}", expanded.display()))
    }
}

fn accept_any(value: &str) -> Result<String, String> {
    Ok(value.to_string())
}

/// Collect and validate deployment parameters
///
/// Returns `None` when the operator declines the confirmation.
pub fn collect_deploy_params(
    prompter: &dyn Prompter,
    log: &RunLog,
    settings: &Settings,
) -> Result<Option<DeployParams>> {
    println!();
    println!("{}", style("dockship deployment").cyan().bold());
    println!("{}", style("=".repeat(20)).dim());
    println!();

    let repository_url =
        prompt_validated(prompter, log, "Repository URL", None, validate_repo_url)?;

    let access_token = prompter.secret("Access token")?;
    log.info("Access token: [hidden]");
    if access_token.is_empty() {
        return Err(ParamsError::EmptyToken.into());
    }

    let branch = prompt_validated(
        prompter,
        log,
        "Branch",
        Some(settings.default_branch.as_str()),
        validate_branch,
    )?;
    let ssh_user = prompt_validated(
        prompter,
        log,
        "SSH username",
        settings.default_ssh_user.as_deref(),
        validate_ssh_user,
    )?;
    let ssh_host = prompt_validated(prompter, log, "Server IP address", None, validate_host)?;
    let ssh_key_path = prompt_validated(
        prompter,
        log,
        "SSH key path",
        Some(settings.default_ssh_key.as_str()),
        validate_key_path,
    )?;
    let default_port = settings.default_app_port.to_string();
    let app_port = prompt_validated(
        prompter,
        log,
        "Application port",
        Some(default_port.as_str()),
        parse_port,
    )?;

    let params = DeployParams::from_input(DeployInput {
        repository_url,
        access_token,
        branch,
        ssh_user,
        ssh_host,
        ssh_key_path,
        app_port,
    })?;

    display_summary(&params);

    let answer = prompter.input("Proceed with deployment? (y/N)", None)?;
    log.info(format!("Proceed with deployment: {}", answer.trim()));
    if matches!(answer.trim(), "y" | "Y") {
        Ok(Some(params))
    } else {
        log.warning("Deployment cancelled by user");
        Ok(None)
    }
}

/// Collect the parameters of a teardown
///
/// Only the project name and SSH username are checked; the server address
/// and key are used as given.
pub fn collect_cleanup_params(
    prompter: &dyn Prompter,
    log: &RunLog,
    settings: &Settings,
) -> Result<CleanupParams> {
    println!();
    println!("{}", style("dockship cleanup").yellow().bold());
    println!("{}", style("=".repeat(16)).dim());
    println!();

    let repository_url = prompt_validated(prompter, log, "Repository URL", None, |url| {
        ProjectName::from_repo_url(url)
            .map(|_| url.to_string())
            .map_err(|e| e.to_string())
    })?;
    let ssh_user = prompt_validated(
        prompter,
        log,
        "SSH username",
        settings.default_ssh_user.as_deref(),
        validate_ssh_user,
    )?;
    let ssh_host = prompt_validated(prompter, log, "Server address", None, accept_any)?;
    let ssh_key_path = prompt_validated(
        prompter,
        log,
        "SSH key path",
        Some(settings.default_ssh_key.as_str()),
        accept_any,
    )?;

    Ok(CleanupParams::new(
        &repository_url,
        &ssh_user,
        &ssh_host,
        &ssh_key_path,
    )?)
}
