//! Repository staging
//!
//! Clones the target repository into the working directory, or brings an
//! existing clone up to date, using the access token embedded in the
//! remote URL. The token never appears in logs or error messages.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::exec::{CommandRunner, CommandSpec, ExecError};
use crate::params::DeployParams;
use crate::runlog::RunLog;

/// Compose manifest names, in lookup order
pub const COMPOSE_FILES: [&str; 4] = [
    "docker-compose.yml",
    "docker-compose.yaml",
    "compose.yml",
    "compose.yaml",
];

/// Errors that can occur while staging the repository
#[derive(Error, Debug)]
pub enum RepoError {
    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error("Failed to clone repository: {0}")]
    CloneFailed(String),

    #[error("Failed to update existing clone ({step}): {detail}")]
    UpdateFailed { step: &'static str, detail: String },

    #[error(
        "No Dockerfile or Compose manifest found in {}. The project must be containerized to deploy.",
        .0.display()
    )]
    NoDockerConfig(PathBuf),
}

/// How the project describes its containers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DockerConfig {
    /// A Compose manifest, by file name
    Compose(String),
    Dockerfile,
}

/// Find the project's Docker configuration, preferring Compose
pub fn detect_docker_config(dir: &Path) -> Option<DockerConfig> {
    COMPOSE_FILES
        .iter()
        .find(|name| dir.join(name).is_file())
        .map(|name| DockerConfig::Compose((*name).to_string()))
        .or_else(|| {
            dir.join("Dockerfile")
                .is_file()
                .then_some(DockerConfig::Dockerfile)
        })
}

/// A local working copy ready to deploy
#[derive(Debug, Clone)]
pub struct StagedRepo {
    pub path: PathBuf,
    pub docker_config: DockerConfig,
    /// True when an existing clone was updated rather than cloned
    pub updated: bool,
}

fn git(params: &DeployParams) -> CommandSpec {
    CommandSpec::new("git")
        .env("GIT_TERMINAL_PROMPT", "0")
        .secret(params.access_token.expose())
}

fn run_git(
    runner: &dyn CommandRunner,
    spec: &CommandSpec,
) -> Result<Result<(), String>, ExecError> {
    let output = runner.run(spec)?;
    if output.success() {
        Ok(Ok(()))
    } else {
        Ok(Err(spec.redact(&output.diagnostics())))
    }
}

/// Clone or update the repository under `workdir`
pub fn stage_repository(
    runner: &dyn CommandRunner,
    log: &RunLog,
    params: &DeployParams,
    workdir: &Path,
) -> Result<StagedRepo, RepoError> {
    let dir = params.project.local_dir(workdir);
    let dir_arg = dir.display().to_string();
    let auth_url = params.authenticated_url();
    let updated = dir.exists();

    if updated {
        log.info(format!(
            "Directory {} already exists, pulling latest changes from {}",
            params.project, params.branch
        ));

        let steps: [(&'static str, Vec<String>); 3] = [
            (
                "set remote",
                vec!["remote".into(), "set-url".into(), "origin".into(), auth_url.clone()],
            ),
            (
                "checkout",
                vec!["checkout".into(), "--end-of-options".into(), params.branch.clone()],
            ),
            (
                "pull",
                vec![
                    "pull".into(),
                    "--end-of-options".into(),
                    "origin".into(),
                    params.branch.clone(),
                ],
            ),
        ];

        for (step, args) in steps {
            let spec = git(params).arg("-C").arg(&dir_arg).args(args);
            if let Err(detail) = run_git(runner, &spec)? {
                return Err(RepoError::UpdateFailed { step, detail });
            }
        }
        log.success("Repository updated");
    } else {
        log.info(format!(
            "Cloning {} (branch {})",
            params.repository_url, params.branch
        ));

        let spec = git(params)
            .args(["clone", "--branch", params.branch.as_str()])
            .arg(&auth_url)
            .arg(&dir_arg)
            .current_dir(workdir);
        if let Err(detail) = run_git(runner, &spec)? {
            return Err(RepoError::CloneFailed(detail));
        }
        log.success("Repository cloned");
    }

    // Keep the token out of .git/config between runs
    let reset = git(params)
        .arg("-C")
        .arg(&dir_arg)
        .args(["remote", "set-url", "origin", params.repository_url.as_str()]);
    if let Err(detail) = run_git(runner, &reset)? {
        log.warning(format!("Could not reset remote URL: {detail}"));
    }

    let docker_config =
        detect_docker_config(&dir).ok_or_else(|| RepoError::NoDockerConfig(dir.clone()))?;
    match &docker_config {
        DockerConfig::Compose(file) => log.success(format!("Found {file}")),
        DockerConfig::Dockerfile => log.success("Found Dockerfile"),
    }

    Ok(StagedRepo {
        path: dir,
        docker_config,
        updated,
    })
}
