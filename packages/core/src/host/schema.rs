//! Remote target description
//!
//! The SSH coordinates of the host a project is deployed to.

use std::path::PathBuf;

/// SSH target for a deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    /// SSH username, also the owner of the remote home directory
    pub user: String,

    /// Server address
    pub host: String,

    /// Private key used for every ssh and rsync invocation
    pub identity_file: PathBuf,
}

impl RemoteTarget {
    pub fn new(
        user: impl Into<String>,
        host: impl Into<String>,
        identity_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            user: user.into(),
            host: host.into(),
            identity_file: identity_file.into(),
        }
    }

    /// `user@host`
    pub fn destination(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }

    /// Home directory of the SSH user on the remote host
    pub fn home_dir(&self) -> String {
        format!("/home/{}", self.user)
    }

    /// Identity and destination arguments shared by all ssh invocations
    pub fn ssh_args(&self) -> Vec<String> {
        vec![
            "-i".to_string(),
            self.identity_file.display().to_string(),
            self.destination(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_and_home() {
        let target = RemoteTarget::new("deploy", "10.0.0.5", "/keys/id_ed25519");
        assert_eq!(target.destination(), "deploy@10.0.0.5");
        assert_eq!(target.home_dir(), "/home/deploy");
    }

    #[test]
    fn test_ssh_args_end_with_destination() {
        let target = RemoteTarget::new("deploy", "10.0.0.5", "/keys/id_ed25519");
        assert_eq!(
            target.ssh_args(),
            vec!["-i", "/keys/id_ed25519", "deploy@10.0.0.5"]
        );
    }
}
