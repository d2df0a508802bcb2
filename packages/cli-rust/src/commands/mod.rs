//! CLI command implementations
//!
//! One entry per mode: a full deployment, or the teardown of a previous one.

mod cleanup;
mod deploy;

pub use cleanup::cmd_cleanup;
pub use deploy::cmd_deploy;
