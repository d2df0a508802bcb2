//! Remote command execution over SSH
//!
//! Every remote step is one non-interactive `ssh` invocation. Batch mode
//! keeps ssh from ever prompting for a password.

use crate::exec::{CommandOutput, CommandRunner, CommandSpec};

use super::error::HostError;
use super::schema::RemoteTarget;

/// Connect timeout for the reachability check, in seconds
pub const CONNECT_TIMEOUT_SECS: u32 = 10;

/// Options shared by ssh and rsync's ssh transport
pub fn ssh_options(connect_timeout: Option<u32>) -> Vec<String> {
    let mut opts = vec![
        "-o".to_string(),
        "BatchMode=yes".to_string(),
        "-o".to_string(),
        "StrictHostKeyChecking=accept-new".to_string(),
    ];
    if let Some(secs) = connect_timeout {
        opts.push("-o".to_string());
        opts.push(format!("ConnectTimeout={secs}"));
    }
    opts
}

/// Quote `value` as a single POSIX shell word
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Runs shell scripts on a remote target
pub struct RemoteShell<'a> {
    runner: &'a dyn CommandRunner,
    target: &'a RemoteTarget,
}

impl<'a> RemoteShell<'a> {
    pub fn new(runner: &'a dyn CommandRunner, target: &'a RemoteTarget) -> Self {
        Self { runner, target }
    }

    pub fn target(&self) -> &RemoteTarget {
        self.target
    }

    /// Build the ssh invocation for `script`
    pub fn command(&self, script: &str) -> CommandSpec {
        CommandSpec::new("ssh")
            .args(ssh_options(Some(CONNECT_TIMEOUT_SECS)))
            .args(self.target.ssh_args())
            .arg(script)
    }

    /// Run `script` and return its output whatever the exit status
    pub fn run(&self, script: &str) -> Result<CommandOutput, HostError> {
        Ok(self.runner.run(&self.command(script))?)
    }

    /// Run `script` and return stdout, failing on a non-zero exit
    pub fn run_checked(&self, action: &str, script: &str) -> Result<String, HostError> {
        let output = self.run(script)?;
        if output.success() {
            Ok(output.stdout)
        } else {
            Err(classify_failure(action, &output, self.target))
        }
    }

    /// Run `script`, forwarding stdout lines, failing on a non-zero exit
    pub fn stream_checked(
        &self,
        action: &str,
        script: &str,
        on_line: &mut dyn FnMut(&str),
    ) -> Result<(), HostError> {
        let output = self.runner.run_streaming(&self.command(script), on_line)?;
        if output.success() {
            Ok(())
        } else {
            Err(classify_failure(action, &output, self.target))
        }
    }
}

/// Map a failed ssh invocation to the most specific error
fn classify_failure(action: &str, output: &CommandOutput, target: &RemoteTarget) -> HostError {
    let detail = output.diagnostics();

    // ssh reserves exit status 255 for its own failures; anything else came
    // from the remote script
    if output.code == Some(255) {
        if detail.contains("Permission denied") || detail.contains("Host key verification failed")
        {
            return HostError::AuthFailed {
                key_hint: target.identity_file.display().to_string(),
            };
        }
        return HostError::ConnectionFailed(detail);
    }

    HostError::CommandFailed {
        action: action.to_string(),
        detail: match output.code {
            Some(code) if detail.is_empty() => format!("exit status {code}"),
            _ => detail,
        },
    }
}

/// Verify the target accepts a non-interactive SSH session
///
/// Runs a trivial `echo` so that connection and authentication problems
/// surface before any provisioning starts.
pub fn check_connectivity(
    runner: &dyn CommandRunner,
    target: &RemoteTarget,
) -> Result<(), HostError> {
    let shell = RemoteShell::new(runner, target);
    let output = shell.run("echo ok")?;

    if output.success() {
        tracing::debug!("SSH connectivity to {} confirmed", target.destination());
        return Ok(());
    }

    match classify_failure("Connectivity check", &output, target) {
        HostError::CommandFailed { detail, .. } => Err(HostError::ConnectionFailed(detail)),
        other => Err(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::fake::FakeRunner;

    fn target() -> RemoteTarget {
        RemoteTarget::new("deploy", "10.0.0.5", "/keys/id")
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("/home/deploy/app"), "'/home/deploy/app'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
    }

    #[test]
    fn test_command_shape() {
        let runner = FakeRunner::new();
        let target = target();
        let shell = RemoteShell::new(&runner, &target);
        let spec = shell.command("uptime");
        assert_eq!(spec.program, "ssh");
        assert!(spec.args.contains(&"BatchMode=yes".to_string()));
        assert!(spec.args.contains(&"ConnectTimeout=10".to_string()));
        assert_eq!(spec.args.last().unwrap(), "uptime");
        assert_eq!(spec.args[spec.args.len() - 2], "deploy@10.0.0.5");
    }

    #[test]
    fn test_check_connectivity_success() {
        let runner = FakeRunner::new().respond("echo ok", 0, "ok\n", "");
        assert!(check_connectivity(&runner, &target()).is_ok());
        assert_eq!(runner.matching("deploy@10.0.0.5 echo ok").len(), 1);
    }

    #[test]
    fn test_check_connectivity_auth_failure() {
        let runner = FakeRunner::new().respond(
            "echo ok",
            255,
            "",
            "deploy@10.0.0.5: Permission denied (publickey).",
        );
        let err = check_connectivity(&runner, &target()).unwrap_err();
        assert!(matches!(err, HostError::AuthFailed { key_hint } if key_hint == "/keys/id"));
    }

    #[test]
    fn test_check_connectivity_unreachable() {
        let runner = FakeRunner::new().respond(
            "echo ok",
            255,
            "",
            "ssh: connect to host 10.0.0.5 port 22: Connection timed out",
        );
        let err = check_connectivity(&runner, &target()).unwrap_err();
        assert!(matches!(err, HostError::ConnectionFailed(msg) if msg.contains("timed out")));
    }

    #[test]
    fn test_remote_permission_error_is_not_auth_failure() {
        let runner = FakeRunner::new().respond(
            "set -e",
            1,
            "",
            "mkdir: cannot create directory '/home/deploy/app/data': Permission denied",
        );
        let target = target();
        let shell = RemoteShell::new(&runner, &target);

        let err = shell
            .stream_checked("Building and starting containers", "set -e\nmkdir data", &mut |_: &str| {})
            .unwrap_err();

        assert!(matches!(
            &err,
            HostError::CommandFailed { action, detail }
                if action == "Building and starting containers" && detail.contains("mkdir")
        ));
    }

    #[test]
    fn test_run_checked_reports_action() {
        let runner = FakeRunner::new().respond("false", 2, "", "");
        let target = target();
        let shell = RemoteShell::new(&runner, &target);
        let err = shell.run_checked("Listing", "false").unwrap_err();
        assert_eq!(err.to_string(), "Listing failed on remote host: exit status 2");
    }
}
