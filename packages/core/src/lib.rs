//! dockship-core - Core library for dockship
//!
//! Everything a deployment run needs apart from the terminal: parameter
//! validation, settings, the run log, the command execution seam, and the
//! stages of a deployment and its teardown.

pub mod cleanup;
pub mod config;
pub mod context;
pub mod deploy;
pub mod exec;
pub mod host;
pub mod params;
pub mod repo;
pub mod runlog;
pub mod validate;
pub mod version;
pub mod workflow;

// Re-export version functions for Rust consumers
pub use version::{get_version, get_version_long};

pub use config::{Settings, load_settings, load_settings_from};
pub use context::{DeployContext, Progress};
pub use exec::{CommandOutput, CommandRunner, CommandSpec, ExecError, SystemRunner};
pub use params::{
    AccessToken, CleanupParams, DeployInput, DeployParams, ParamsError, ProjectName, expand_tilde,
};
pub use runlog::{Level, RunLog};
pub use workflow::{WorkflowError, run_cleanup, run_deployment};
