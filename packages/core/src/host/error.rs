//! Host-specific error types
//!
//! Errors that can occur while talking to the remote host over SSH.

use thiserror::Error;

use crate::exec::ExecError;

/// Errors that can occur during remote host operations
#[derive(Error, Debug)]
pub enum HostError {
    /// ssh could not be started
    #[error(transparent)]
    Exec(#[from] ExecError),

    /// SSH connection failed (unreachable host, timeout, refused)
    #[error("SSH connection failed: {0}")]
    ConnectionFailed(String),

    /// SSH authentication failed
    #[error("SSH authentication failed. Check that the server accepts the key: {key_hint}")]
    AuthFailed { key_hint: String },

    /// A remote command exited non-zero
    #[error("{action} failed on remote host: {detail}")]
    CommandFailed { action: String, detail: String },

    /// Distribution without a known package manager
    #[error("Unsupported Linux distribution: {0}. Please install Docker and Nginx manually.")]
    UnsupportedDistro(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_error_displays_correctly() {
        let err = HostError::AuthFailed {
            key_hint: "/home/me/.ssh/id_rsa".to_string(),
        };
        assert!(err.to_string().contains("/home/me/.ssh/id_rsa"));

        let err = HostError::CommandFailed {
            action: "Provisioning".to_string(),
            detail: "apt-get: lock held".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Provisioning failed on remote host: apt-get: lock held"
        );

        let err = HostError::Exec(ExecError::NotFound("ssh".to_string()));
        assert!(err.to_string().contains("ssh not found"));
    }
}
