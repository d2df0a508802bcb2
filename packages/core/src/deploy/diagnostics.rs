//! Post-deploy diagnostics
//!
//! Everything here is informational. Failures become warnings and never
//! fail the run.

use crate::context::DeployContext;
use crate::host::RemoteShell;

/// Lines of container output shown after a deploy
pub const LOG_TAIL_LINES: u32 = 20;

/// Port the container serves on, used when the application port does not answer
const FALLBACK_PROBE_PORT: u16 = 80;

/// Result of the internal reachability probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// A port answered with a 2xx/3xx response
    Reachable { port: u16, attempt: u32 },
    /// No port answered within the configured rounds
    Unreachable { attempts: u32 },
}

impl ProbeOutcome {
    pub fn is_reachable(&self) -> bool {
        matches!(self, ProbeOutcome::Reachable { .. })
    }
}

/// Names of the running containers, logged as a table, first listed first
pub fn list_containers(ctx: &DeployContext<'_>, shell: &RemoteShell<'_>) -> Vec<String> {
    let script = "sudo docker ps --format '{{.Names}}\\t{{.Status}}\\t{{.Ports}}'";
    let stdout = match shell.run_checked("Listing containers", script) {
        Ok(stdout) => stdout,
        Err(e) => {
            ctx.log.warning(format!("Could not list containers: {e}"));
            return Vec::new();
        }
    };

    let rows: Vec<Vec<&str>> = stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.split('\t').collect())
        .collect();

    if rows.is_empty() {
        ctx.log.warning("No running containers found");
        return Vec::new();
    }

    ctx.log.info("Running containers:");
    for row in &rows {
        ctx.log.info(format!("  {}", row.join("  ")));
    }

    rows.iter()
        .filter_map(|row| row.first().map(|name| name.trim().to_string()))
        .collect()
}

/// Log the tail of a container's output
pub fn show_container_logs(ctx: &DeployContext<'_>, shell: &RemoteShell<'_>, container: &str) {
    let script = format!("sudo docker logs --tail {LOG_TAIL_LINES} {container} 2>&1");
    match shell.run_checked("Reading container logs", &script) {
        Ok(stdout) => {
            ctx.log.info(format!("Recent logs of {container}:"));
            for line in stdout.lines() {
                ctx.log.info(format!("  {line}"));
            }
        }
        Err(e) => ctx
            .log
            .warning(format!("Could not read logs of {container}: {e}")),
    }
}

/// Remote script printing the first port that answers, or exiting 1
pub fn probe_script(app_port: u16) -> String {
    let check = |port: u16| {
        format!("curl -fsS -o /dev/null --max-time 5 http://localhost:{port}")
    };
    if app_port == FALLBACK_PROBE_PORT {
        format!("if {}; then echo {app_port}; else exit 1; fi", check(app_port))
    } else {
        format!(
            "if {}; then echo {app_port}; elif {}; then echo {FALLBACK_PROBE_PORT}; else exit 1; fi",
            check(app_port),
            check(FALLBACK_PROBE_PORT)
        )
    }
}

/// Probe the application from the host itself
///
/// Retries `probe_attempts` rounds, `probe_interval_secs` apart.
pub fn probe(ctx: &DeployContext<'_>, shell: &RemoteShell<'_>, app_port: u16) -> ProbeOutcome {
    let attempts = ctx.settings.probe_attempts.max(1);
    let script = probe_script(app_port);

    for attempt in 1..=attempts {
        match shell.run(&script) {
            Ok(output) if output.success() => {
                let port = output.stdout.trim().parse().unwrap_or(app_port);
                ctx.log.success(format!(
                    "Application responds on port {port} (attempt {attempt}/{attempts})"
                ));
                return ProbeOutcome::Reachable { port, attempt };
            }
            Ok(_) => tracing::debug!("Probe attempt {} of {} failed", attempt, attempts),
            Err(e) => tracing::debug!("Probe attempt {} could not run: {}", attempt, e),
        }

        if attempt < attempts {
            ctx.wait("Waiting before next probe", ctx.probe_interval());
        }
    }

    ctx.log.warning(format!(
        "Application did not respond on port {app_port} or {FALLBACK_PROBE_PORT} after {attempts} attempts. Check the container logs."
    ));
    ProbeOutcome::Unreachable { attempts }
}
