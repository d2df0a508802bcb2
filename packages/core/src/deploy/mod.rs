//! Deployment to the remote host
//!
//! Scaffolds missing serving artifacts, mirrors the working copy to the
//! host, replaces the running container, publishes it through the host's
//! Nginx and finally runs diagnostics.

pub mod artifacts;
pub mod diagnostics;
pub mod remote;

use std::path::Path;

use thiserror::Error;

use crate::context::DeployContext;
use crate::exec::ExecError;
use crate::host::{HostError, RemoteShell, shell_quote};
use crate::params::DeployParams;

pub use artifacts::{Scaffolded, ensure_local_artifacts, proxy_site};
pub use diagnostics::{ProbeOutcome, list_containers, probe, probe_script, show_container_logs};
pub use remote::{
    BuildStrategy, build_script, proxy_script, proxy_site_path, release_port_80_script,
    transfer_command,
};

/// Errors that abort a deployment
#[derive(Error, Debug)]
pub enum DeployError {
    #[error(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error("File transfer failed: {0}")]
    Transfer(String),
}

/// What was deployed and how it answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentReport {
    pub container_name: String,
    pub remote_dir: String,
    pub strategy: BuildStrategy,
    /// False when the app publishes port 80 itself and host Nginx was stopped
    pub proxy_configured: bool,
    pub probe: ProbeOutcome,
    pub access_url: String,
}

/// Deploy the staged tree at `local_dir`
pub fn deploy_project(
    ctx: &DeployContext<'_>,
    params: &DeployParams,
    local_dir: &Path,
) -> Result<DeploymentReport, DeployError> {
    let target = &params.target;
    let shell = RemoteShell::new(ctx.runner, target);
    let container = params.project.container_name();
    let remote_dir = params.project.remote_dir(target);

    ensure_local_artifacts(local_dir, ctx.log);

    ctx.log.info(format!(
        "Transferring files to {}:{}",
        target.destination(),
        remote_dir
    ));
    shell.run_checked(
        "Creating remote directory",
        &format!("mkdir -p {}", shell_quote(&remote_dir)),
    )?;
    let output = ctx
        .runner
        .run(&transfer_command(local_dir, target, &remote_dir))?;
    if !output.success() {
        return Err(DeployError::Transfer(output.diagnostics()));
    }
    ctx.log.success("Files transferred");

    if params.app_port == 80 {
        release_port_80(ctx, &shell);
    }

    let strategy = BuildStrategy::detect(local_dir);
    ctx.log
        .info(format!("Building and starting {container} using {strategy}"));
    shell.stream_checked(
        "Building and starting containers",
        &build_script(&strategy, &remote_dir, &container, params.app_port),
        &mut |line: &str| ctx.log.info(line),
    )?;
    ctx.log.success(format!("Container {container} started"));

    let proxy_configured = configure_proxy(ctx, &shell, params)?;

    ctx.wait("Waiting for containers to start", ctx.settle_delay());

    let running = list_containers(ctx, &shell);
    if let Some(first) = running.first() {
        show_container_logs(ctx, &shell, first);
    }

    let probe = probe(ctx, &shell, params.app_port);

    Ok(DeploymentReport {
        container_name: container,
        remote_dir,
        strategy,
        proxy_configured,
        probe,
        access_url: format!("http://{}", target.host),
    })
}

/// Stop the host Nginx, which the provisioner left listening on port 80
fn release_port_80(ctx: &DeployContext<'_>, shell: &RemoteShell<'_>) {
    ctx.log.warning(
        "Application port is 80; stopping host Nginx so the container can bind it",
    );
    match shell.run(&release_port_80_script()) {
        Ok(output) if output.success() => {}
        Ok(output) => ctx.log.warning(format!(
            "Could not stop host Nginx: {}",
            output.diagnostics()
        )),
        Err(e) => ctx.log.warning(format!("Could not stop host Nginx: {e}")),
    }
}

/// Publish the application port on the host's port 80
fn configure_proxy(
    ctx: &DeployContext<'_>,
    shell: &RemoteShell<'_>,
    params: &DeployParams,
) -> Result<bool, DeployError> {
    if params.app_port == 80 {
        ctx.log
            .info("Application publishes port 80 itself, no Nginx proxy needed");
        return Ok(false);
    }

    ctx.log.info(format!(
        "Configuring Nginx to forward port 80 to {}",
        params.app_port
    ));
    shell.stream_checked(
        "Configuring Nginx",
        &proxy_script(params.project.as_str(), &params.target.host, params.app_port),
        &mut |line: &str| ctx.log.info(line),
    )?;
    ctx.log.success(format!(
        "Nginx site {} enabled",
        proxy_site_path(params.project.as_str())
    ));
    Ok(true)
}
