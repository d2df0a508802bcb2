//! Remote host access
//!
//! - Target description (user, address, key)
//! - Non-interactive SSH execution and the reachability check
//! - Idempotent provisioning of Docker, Docker Compose and Nginx

mod error;
mod provision;
mod schema;
mod ssh;

// Public exports
pub use error::HostError;
pub use provision::{DistroFamily, DistroInfo, detect_distro, provision_host, provisioning_script};
pub use schema::RemoteTarget;
pub use ssh::{CONNECT_TIMEOUT_SECS, RemoteShell, check_connectivity, shell_quote, ssh_options};
