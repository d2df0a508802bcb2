//! Teardown of a deployment
//!
//! Every remote step tolerates failure so that partially deployed or
//! already removed projects can still be cleaned up.

use std::fs;
use std::path::Path;

use crate::context::DeployContext;
use crate::host::{RemoteShell, shell_quote};
use crate::params::CleanupParams;
use crate::repo::COMPOSE_FILES;

/// What the teardown managed to do
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub remote_cleaned: bool,
    pub local_removed: bool,
}

/// Remote teardown script; each step ends in `|| true`
pub fn cleanup_script(params: &CleanupParams) -> String {
    let project = params.project.as_str();
    let container = params.project.container_name();
    let remote_dir = shell_quote(&params.project.remote_dir(&params.target));

    let manifests = COMPOSE_FILES
        .iter()
        .map(|name| format!("[ -f {name} ]"))
        .collect::<Vec<_>>()
        .join(" || ");

    [
        format!("if [ -d {remote_dir} ]; then"),
        format!("  cd {remote_dir}"),
        format!("  if {manifests}; then"),
        "    COMPOSE=\"docker-compose\"".to_string(),
        "    command -v docker-compose >/dev/null 2>&1 || COMPOSE=\"docker compose\"".to_string(),
        "    sudo $COMPOSE down --rmi all --remove-orphans 2>/dev/null || true".to_string(),
        "  fi".to_string(),
        "  cd ~".to_string(),
        "fi".to_string(),
        format!("sudo docker stop {container} 2>/dev/null || true"),
        format!("sudo docker rm {container} 2>/dev/null || true"),
        format!("sudo docker rmi {container} 2>/dev/null || true"),
        format!("sudo rm -f /etc/nginx/sites-enabled/{project} || true"),
        format!("sudo rm -f /etc/nginx/sites-available/{project} || true"),
        format!("sudo rm -f /etc/nginx/conf.d/{project}.conf || true"),
        "sudo systemctl reload nginx 2>/dev/null || sudo service nginx reload 2>/dev/null || sudo nginx -s reload 2>/dev/null || true".to_string(),
        format!("rm -rf {remote_dir} || sudo rm -rf {remote_dir} || true"),
        "echo 'Remote cleanup finished'".to_string(),
    ]
    .join("\n")
}

/// Tear down the remote deployment and the local clone under `workdir`
///
/// Never fails: unreachable hosts and missing directories are warnings.
pub fn cleanup_project(
    ctx: &DeployContext<'_>,
    params: &CleanupParams,
    workdir: &Path,
) -> CleanupReport {
    let mut report = CleanupReport::default();
    let shell = RemoteShell::new(ctx.runner, &params.target);

    ctx.log.info(format!(
        "Removing {} from {}",
        params.project,
        params.target.destination()
    ));
    match shell.stream_checked(
        "Remote cleanup",
        &cleanup_script(params),
        &mut |line: &str| ctx.log.info(line),
    ) {
        Ok(()) => {
            report.remote_cleaned = true;
            ctx.log.success("Remote resources removed");
        }
        Err(e) => ctx.log.warning(format!("Remote cleanup incomplete: {e}")),
    }

    let local = params.project.local_dir(workdir);
    if local.exists() {
        match fs::remove_dir_all(&local) {
            Ok(()) => {
                report.local_removed = true;
                ctx.log
                    .success(format!("Removed local directory {}", local.display()));
            }
            Err(e) => ctx.log.warning(format!(
                "Could not remove local directory {}: {e}",
                local.display()
            )),
        }
    } else {
        ctx.log
            .info(format!("No local directory {} to remove", local.display()));
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::exec::fake::FakeRunner;
    use crate::runlog::RunLog;

    fn params() -> CleanupParams {
        CleanupParams::new("https://example.com/app.git", "deploy", "10.0.0.5", "/keys/id").unwrap()
    }

    #[test]
    fn test_script_removes_container_and_directory() {
        let script = cleanup_script(&params());
        assert!(script.contains("sudo docker stop app_app 2>/dev/null || true"));
        assert!(script.contains("sudo docker rm app_app 2>/dev/null || true"));
        assert!(script.contains("sudo docker rmi app_app 2>/dev/null || true"));
        assert!(script.contains("rm -rf '/home/deploy/app'"));
        assert!(script.contains("/etc/nginx/sites-enabled/app"));
        assert!(script.contains("/etc/nginx/conf.d/app.conf"));
        assert!(script.contains("down --rmi all"));
        assert!(!script.contains("set -e"));
    }

    #[test]
    fn test_cleanup_removes_remote_and_local() {
        let work = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(work.path().join("app")).unwrap();
        let log = RunLog::open(&work.path().join("test.log"), false).unwrap();
        let settings = Settings::default();
        let runner = FakeRunner::new();
        let ctx = DeployContext::new(&runner, &log, &settings);

        let report = cleanup_project(&ctx, &params(), work.path());

        assert_eq!(
            report,
            CleanupReport {
                remote_cleaned: true,
                local_removed: true
            }
        );
        assert!(!work.path().join("app").exists());
        let calls = runner.matching("deploy@10.0.0.5");
        assert_eq!(calls.len(), 1);
        assert!(calls[0].contains("app_app"));
        assert!(calls[0].contains("/home/deploy/app"));
    }

    #[test]
    fn test_unreachable_host_is_a_warning() {
        let work = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(work.path().join("app")).unwrap();
        let log = RunLog::open(&work.path().join("test.log"), false).unwrap();
        let settings = Settings::default();
        let runner = FakeRunner::new().respond(
            "deploy@10.0.0.5",
            255,
            "",
            "ssh: connect to host 10.0.0.5 port 22: No route to host",
        );
        let ctx = DeployContext::new(&runner, &log, &settings);

        let report = cleanup_project(&ctx, &params(), work.path());

        assert!(!report.remote_cleaned);
        assert!(report.local_removed);
        let contents = std::fs::read_to_string(work.path().join("test.log")).unwrap();
        assert!(contents.contains("[WARNING] Remote cleanup incomplete"));
        assert!(!contents.contains("[ERROR]"));
    }

    #[test]
    fn test_missing_local_directory_is_fine() {
        let work = tempfile::tempdir().unwrap();
        let log = RunLog::open(&work.path().join("test.log"), false).unwrap();
        let settings = Settings::default();
        let runner = FakeRunner::new();
        let ctx = DeployContext::new(&runner, &log, &settings);

        let report = cleanup_project(&ctx, &params(), work.path());
        assert!(report.remote_cleaned);
        assert!(!report.local_removed);
    }
}
