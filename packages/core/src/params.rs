//! Deployment parameters
//!
//! The single configuration record of a run. It is built once from
//! operator input, validated as a whole, and then only borrowed by the
//! stages that follow.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::host::RemoteTarget;
use crate::validate::{
    is_safe_project_name, is_valid_branch_name, is_valid_ipv4_syntax, is_valid_repo_url,
    is_valid_ssh_user,
};

/// Errors raised while assembling parameters
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParamsError {
    #[error("Invalid repository URL: {0}. Expected https://<host>/<path>.git")]
    InvalidRepoUrl(String),

    #[error("Access token cannot be empty")]
    EmptyToken,

    #[error("Invalid branch name: {0}")]
    InvalidBranch(String),

    #[error("SSH username cannot be empty")]
    EmptyUser,

    #[error("Invalid SSH username: {0}")]
    InvalidUser(String),

    #[error("Invalid server address: {0}. Expected an IPv4 address")]
    InvalidHost(String),

    #[error("SSH key not found: {}", .0.display())]
    KeyNotFound(PathBuf),

    #[error(
        "Unsafe project name '{0}'. Repository names may only contain letters, digits, '.', '_' and '-'"
    )]
    UnsafeProjectName(String),
}

/// Personal access token used for authenticated HTTPS git operations
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Result<Self, ParamsError> {
        let token = token.into();
        if token.is_empty() {
            return Err(ParamsError::EmptyToken);
        }
        Ok(Self(token))
    }

    /// The raw secret. Callers must not log it.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(********)")
    }
}

/// Project name derived from the repository URL
///
/// Used verbatim as the local clone directory, the remote directory
/// under the SSH user's home, and the container/image name prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectName(String);

impl ProjectName {
    pub fn new(name: impl Into<String>) -> Result<Self, ParamsError> {
        let name = name.into();
        if !is_safe_project_name(&name) {
            return Err(ParamsError::UnsafeProjectName(name));
        }
        Ok(Self(name))
    }

    /// Base name of the URL path with a trailing `.git` stripped
    pub fn from_repo_url(url: &str) -> Result<Self, ParamsError> {
        let base = url.trim_end_matches('/').rsplit('/').next().unwrap_or("");
        let base = base.strip_suffix(".git").unwrap_or(base);
        Self::new(base)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Container and image name, `<project>_app`
    pub fn container_name(&self) -> String {
        format!("{}_app", self.0)
    }

    /// Deployment directory on the remote host
    pub fn remote_dir(&self, target: &RemoteTarget) -> String {
        format!("{}/{}", target.home_dir(), self.0)
    }

    /// Clone directory under the local working directory
    pub fn local_dir(&self, workdir: &Path) -> PathBuf {
        workdir.join(&self.0)
    }
}

impl fmt::Display for ProjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fully validated parameters for a deployment run
#[derive(Debug, Clone)]
pub struct DeployParams {
    pub repository_url: String,
    pub access_token: AccessToken,
    pub branch: String,
    pub target: RemoteTarget,
    pub app_port: u16,
    pub project: ProjectName,
}

/// Raw operator answers, before validation
#[derive(Debug, Clone, Default)]
pub struct DeployInput {
    pub repository_url: String,
    pub access_token: String,
    pub branch: String,
    pub ssh_user: String,
    pub ssh_host: String,
    pub ssh_key_path: String,
    pub app_port: u16,
}

impl DeployParams {
    /// Validate every field and derive the project name
    ///
    /// Nothing is created or contacted here; only the key file's
    /// existence is checked.
    pub fn from_input(input: DeployInput) -> Result<Self, ParamsError> {
        if !is_valid_repo_url(&input.repository_url) {
            return Err(ParamsError::InvalidRepoUrl(input.repository_url));
        }
        let access_token = AccessToken::new(input.access_token)?;
        check_ssh_user(&input.ssh_user)?;
        if !is_valid_ipv4_syntax(&input.ssh_host) {
            return Err(ParamsError::InvalidHost(input.ssh_host));
        }
        let key = expand_tilde(&input.ssh_key_path);
        if !key.is_file() {
            return Err(ParamsError::KeyNotFound(key));
        }
        let project = ProjectName::from_repo_url(&input.repository_url)?;
        let branch = if input.branch.is_empty() {
            "main".to_string()
        } else {
            input.branch
        };
        if !is_valid_branch_name(&branch) {
            return Err(ParamsError::InvalidBranch(branch));
        }

        Ok(Self {
            repository_url: input.repository_url,
            access_token,
            branch,
            target: RemoteTarget::new(input.ssh_user, input.ssh_host, key),
            app_port: input.app_port,
            project,
        })
    }

    /// Clone URL with the token spliced in after the scheme
    pub fn authenticated_url(&self) -> String {
        authenticated_url(&self.repository_url, &self.access_token)
    }
}

/// Parameters needed to tear a deployment down
#[derive(Debug, Clone)]
pub struct CleanupParams {
    pub project: ProjectName,
    pub target: RemoteTarget,
}

impl CleanupParams {
    /// Only the project name is validated; the target is taken as given
    pub fn new(
        repository_url: &str,
        ssh_user: &str,
        ssh_host: &str,
        ssh_key_path: &str,
    ) -> Result<Self, ParamsError> {
        check_ssh_user(ssh_user)?;
        Ok(Self {
            project: ProjectName::from_repo_url(repository_url)?,
            target: RemoteTarget::new(ssh_user, ssh_host, expand_tilde(ssh_key_path)),
        })
    }
}

/// The user ends up in `user@host` and in `/home/<user>`, so it must not
/// look like an ssh option or contain path or shell metacharacters
fn check_ssh_user(user: &str) -> Result<(), ParamsError> {
    if user.is_empty() {
        return Err(ParamsError::EmptyUser);
    }
    if !is_valid_ssh_user(user) {
        return Err(ParamsError::InvalidUser(user.to_string()));
    }
    Ok(())
}

/// Insert `token:<token>@` right after `https://`
pub fn authenticated_url(url: &str, token: &AccessToken) -> String {
    match url.strip_prefix("https://") {
        Some(rest) => format!("https://token:{}@{}", token.expose(), rest),
        None => url.to_string(),
    }
}

/// Expand a leading `~` to the current user's home directory
pub fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
