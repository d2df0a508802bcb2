//! End-to-end runs
//!
//! A deployment is a fixed sequence: stage the repository, check SSH,
//! provision the host, deploy. The first fatal error stops the run; nothing
//! already done is rolled back.

use std::path::Path;

use thiserror::Error;

use crate::cleanup::{CleanupReport, cleanup_project};
use crate::context::DeployContext;
use crate::deploy::{DeployError, DeploymentReport, ProbeOutcome, deploy_project};
use crate::host::{HostError, RemoteShell, check_connectivity, provision_host};
use crate::params::{CleanupParams, DeployParams};
use crate::repo::{RepoError, stage_repository};

/// Any fatal error of a deployment run
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error(transparent)]
    Repo(#[from] RepoError),

    #[error(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    Deploy(#[from] DeployError),
}

/// Deploy `params` using `workdir` for the local clone
pub fn run_deployment(
    ctx: &DeployContext<'_>,
    params: &DeployParams,
    workdir: &Path,
) -> Result<DeploymentReport, WorkflowError> {
    let log = ctx.log;
    let target = &params.target;

    log.info(format!("Starting deployment of {}", params.project));
    let staged = stage_repository(ctx.runner, log, params, workdir)?;

    log.info(format!("Checking SSH connection to {}", target.destination()));
    ctx.during("Connecting over SSH", || check_connectivity(ctx.runner, target))?;
    log.success("SSH connection established");

    log.info("Provisioning remote host");
    let shell = RemoteShell::new(ctx.runner, target);
    let distro = provision_host(&shell, &mut |line: &str| log.info(line))?;
    log.success(format!("Remote host ready ({})", distro.family));

    let report = deploy_project(ctx, params, &staged.path)?;

    if let ProbeOutcome::Unreachable { .. } = report.probe {
        log.warning("Deployment finished but the application has not answered yet");
    }
    log.success(format!(
        "Deployment of {} complete. Access the application at {}",
        params.project, report.access_url
    ));

    Ok(report)
}

/// Tear down the deployment described by `params`
pub fn run_cleanup(
    ctx: &DeployContext<'_>,
    params: &CleanupParams,
    workdir: &Path,
) -> CleanupReport {
    ctx.log.info(format!("Starting cleanup of {}", params.project));
    let report = cleanup_project(ctx, params, workdir);
    ctx.log.success(format!("Cleanup of {} finished", params.project));
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::exec::CommandSpec;
    use crate::exec::fake::FakeRunner;
    use crate::params::DeployInput;
    use crate::runlog::RunLog;
    use std::fs;
    use std::path::PathBuf;

    const UBUNTU: &str = "ID=ubuntu\nID_LIKE=debian\nPRETTY_NAME=\"Ubuntu 22.04\"\n";

    fn fast_settings() -> Settings {
        Settings {
            settle_delay_secs: 0,
            probe_interval_secs: 0,
            ..Settings::default()
        }
    }

    fn params(key: &Path) -> DeployParams {
        DeployParams::from_input(DeployInput {
            repository_url: "https://example.com/app.git".to_string(),
            access_token: "tok-123".to_string(),
            branch: "main".to_string(),
            ssh_user: "deploy".to_string(),
            ssh_host: "203.0.113.10".to_string(),
            ssh_key_path: key.display().to_string(),
            app_port: 9090,
        })
        .unwrap()
    }

    fn clone_with_dockerfile(spec: &CommandSpec) {
        let dest = PathBuf::from(spec.args.last().unwrap());
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("Dockerfile"), "FROM nginx:alpine\n").unwrap();
    }

    #[test]
    fn test_end_to_end_deployment() {
        let work = tempfile::tempdir().unwrap();
        let key = tempfile::NamedTempFile::new().unwrap();
        let log_path = work.path().join("deploy.log");
        let log = RunLog::open(&log_path, false).unwrap();
        let settings = fast_settings();
        let runner = FakeRunner::new()
            .on_call("git clone", clone_with_dockerfile)
            .respond("/etc/os-release", 0, UBUNTU, "")
            .respond("curl -fsS", 0, "9090\n", "");
        let ctx = DeployContext::new(&runner, &log, &settings);

        let report = run_deployment(&ctx, &params(key.path()), work.path()).unwrap();

        assert_eq!(report.container_name, "app_app");
        assert_eq!(report.strategy, crate::deploy::BuildStrategy::Dockerfile);
        assert_eq!(report.probe, ProbeOutcome::Reachable { port: 9090, attempt: 1 });

        assert_eq!(runner.matching("docker run -d --name app_app -p 9090:80 app_app").len(), 1);
        assert_eq!(runner.matching("http://localhost:9090").len(), 1);

        let contents = fs::read_to_string(&log_path).unwrap();
        let last = contents.lines().last().unwrap();
        assert!(last.contains("[SUCCESS]"));
        assert!(last.contains("http://203.0.113.10"));
        assert!(!contents.contains("tok-123"));
    }

    #[test]
    fn test_stages_run_in_order() {
        let work = tempfile::tempdir().unwrap();
        let key = tempfile::NamedTempFile::new().unwrap();
        let log = RunLog::open(&work.path().join("deploy.log"), false).unwrap();
        let settings = fast_settings();
        let runner = FakeRunner::new()
            .on_call("git clone", clone_with_dockerfile)
            .respond("/etc/os-release", 0, UBUNTU, "");
        let ctx = DeployContext::new(&runner, &log, &settings);

        run_deployment(&ctx, &params(key.path()), work.path()).unwrap();

        let lines = runner.command_lines();
        let position = |needle: &str| lines.iter().position(|l| l.contains(needle)).unwrap();
        assert!(position("git clone") < position("echo ok"));
        assert!(position("echo ok") < position("/etc/os-release"));
        assert!(position("/etc/os-release") < position("rsync"));
    }

    #[test]
    fn test_connectivity_failure_stops_before_provisioning() {
        let work = tempfile::tempdir().unwrap();
        let key = tempfile::NamedTempFile::new().unwrap();
        let log = RunLog::open(&work.path().join("deploy.log"), false).unwrap();
        let settings = fast_settings();
        let runner = FakeRunner::new()
            .on_call("git clone", clone_with_dockerfile)
            .respond("echo ok", 255, "", "Connection refused");
        let ctx = DeployContext::new(&runner, &log, &settings);

        let err = run_deployment(&ctx, &params(key.path()), work.path()).unwrap_err();

        assert!(matches!(err, WorkflowError::Host(HostError::ConnectionFailed(_))));
        assert!(runner.matching("/etc/os-release").is_empty());
        assert!(runner.matching("rsync").is_empty());
    }

    #[test]
    fn test_missing_docker_config_stops_before_ssh() {
        let work = tempfile::tempdir().unwrap();
        let key = tempfile::NamedTempFile::new().unwrap();
        let log = RunLog::open(&work.path().join("deploy.log"), false).unwrap();
        let settings = fast_settings();
        let runner = FakeRunner::new().on_call("git clone", |spec: &CommandSpec| {
            fs::create_dir_all(spec.args.last().unwrap()).unwrap();
        });
        let ctx = DeployContext::new(&runner, &log, &settings);

        let err = run_deployment(&ctx, &params(key.path()), work.path()).unwrap_err();

        assert!(matches!(err, WorkflowError::Repo(RepoError::NoDockerConfig(_))));
        assert!(runner.matching("BatchMode=yes").is_empty());
    }

    #[test]
    fn test_cleanup_run() {
        let work = tempfile::tempdir().unwrap();
        fs::create_dir_all(work.path().join("app")).unwrap();
        let log = RunLog::open(&work.path().join("cleanup.log"), false).unwrap();
        let settings = fast_settings();
        let runner = FakeRunner::new();
        let ctx = DeployContext::new(&runner, &log, &settings);
        let params =
            CleanupParams::new("https://example.com/app.git", "deploy", "203.0.113.10", "/k")
                .unwrap();

        let report = run_cleanup(&ctx, &params, work.path());

        assert!(report.remote_cleaned && report.local_removed);
        assert_eq!(runner.matching("docker rm app_app").len(), 1);
        assert_eq!(runner.matching("'/home/deploy/app'").len(), 1);
    }
}
