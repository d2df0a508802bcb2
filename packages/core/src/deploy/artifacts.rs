//! Scaffolding for projects without serving artifacts
//!
//! Files are only written when absent; existing project files are never
//! touched.

use std::fs;
use std::path::Path;

use crate::runlog::RunLog;

/// Reverse-proxy/static config with a `/health` endpoint
pub const DEFAULT_NGINX_CONF: &str = include_str!("templates/nginx.conf");

/// Placeholder landing page
pub const DEFAULT_INDEX_HTML: &str = include_str!("templates/index.html");

/// Last-resort image serving the landing page
pub const FALLBACK_DOCKERFILE: &str = include_str!("templates/Dockerfile.fallback");

/// Host-side Nginx site forwarding to the published application port
const PROXY_SITE_TEMPLATE: &str = include_str!("templates/proxy.conf");

pub const NGINX_CONF_FILE: &str = "nginx.conf";
pub const INDEX_HTML_FILE: &str = "index.html";

/// Which files were generated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scaffolded {
    pub nginx_conf: bool,
    pub index_html: bool,
}

/// Write the default Nginx config and landing page if they are missing
///
/// Write failures are reported as warnings; the deployment does not
/// depend on these files.
pub fn ensure_local_artifacts(dir: &Path, log: &RunLog) -> Scaffolded {
    Scaffolded {
        nginx_conf: write_if_missing(dir, NGINX_CONF_FILE, DEFAULT_NGINX_CONF, log),
        index_html: write_if_missing(dir, INDEX_HTML_FILE, DEFAULT_INDEX_HTML, log),
    }
}

fn write_if_missing(dir: &Path, name: &str, contents: &str, log: &RunLog) -> bool {
    let path = dir.join(name);
    if path.exists() {
        return false;
    }

    match fs::write(&path, contents) {
        Ok(()) => {
            log.info(format!("Created default {name}"));
            true
        }
        Err(e) => {
            log.warning(format!("Could not create default {name}: {e}"));
            false
        }
    }
}

/// Render the host reverse-proxy site for `server_name`
pub fn proxy_site(server_name: &str, app_port: u16) -> String {
    PROXY_SITE_TEMPLATE
        .replace("{server_name}", server_name)
        .replace("{app_port}", &app_port.to_string())
}
