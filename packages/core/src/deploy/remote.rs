//! Remote side of a deployment
//!
//! File transfer with rsync, and the shell scripts that replace the running
//! container and publish it through the host's Nginx.

use std::path::Path;

use crate::exec::CommandSpec;
use crate::host::{RemoteTarget, shell_quote, ssh_options};
use crate::repo::{DockerConfig, detect_docker_config};

use super::artifacts::{FALLBACK_DOCKERFILE, proxy_site};

/// Paths excluded from the transfer
pub const SYNC_EXCLUDES: [&str; 4] = [".git", "node_modules", "__pycache__", ".venv"];

/// Heredoc delimiter for files written by remote scripts
const EOF_MARKER: &str = "DOCKSHIP_EOF";

/// How the container is built on the remote host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildStrategy {
    /// `compose up -d --build` with the given manifest
    Compose(String),
    /// `docker build` + `docker run` from the project's Dockerfile
    Dockerfile,
    /// `docker build` + `docker run` from a generated static-site Dockerfile
    Fallback,
}

impl BuildStrategy {
    /// Choose the strategy from the local tree, which the transfer mirrors
    pub fn detect(dir: &Path) -> Self {
        match detect_docker_config(dir) {
            Some(DockerConfig::Compose(file)) => BuildStrategy::Compose(file),
            Some(DockerConfig::Dockerfile) => BuildStrategy::Dockerfile,
            None => BuildStrategy::Fallback,
        }
    }
}

impl std::fmt::Display for BuildStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildStrategy::Compose(file) => write!(f, "Docker Compose ({file})"),
            BuildStrategy::Dockerfile => write!(f, "Dockerfile"),
            BuildStrategy::Fallback => write!(f, "fallback static image"),
        }
    }
}

/// rsync invocation mirroring `local_dir` into `remote_dir`, deletions included
pub fn transfer_command(local_dir: &Path, target: &RemoteTarget, remote_dir: &str) -> CommandSpec {
    let mut ssh = vec!["ssh".to_string()];
    ssh.extend(ssh_options(None));
    ssh.push("-i".to_string());
    ssh.push(shell_quote(&target.identity_file.display().to_string()));

    let mut spec = CommandSpec::new("rsync").args(["-az", "--delete"]);
    for exclude in SYNC_EXCLUDES {
        spec = spec.arg("--exclude").arg(exclude);
    }
    spec.arg("-e")
        .arg(ssh.join(" "))
        .arg(format!("{}/", local_dir.display()))
        .arg(format!("{}:{}/", target.destination(), remote_dir))
}

fn compose_prelude() -> &'static str {
    "COMPOSE=\"docker-compose\"\n\
     if ! command -v docker-compose >/dev/null 2>&1; then COMPOSE=\"docker compose\"; fi"
}

/// Script that replaces any previous instance and starts the new one
pub fn build_script(
    strategy: &BuildStrategy,
    remote_dir: &str,
    container: &str,
    app_port: u16,
) -> String {
    let mut lines = vec![
        "set -e".to_string(),
        format!("cd {}", shell_quote(remote_dir)),
        compose_prelude().to_string(),
        "echo 'Stopping previous deployment...'".to_string(),
    ];

    if let BuildStrategy::Compose(file) = strategy {
        lines.push(format!(
            "sudo $COMPOSE -f {file} down --remove-orphans 2>/dev/null || true"
        ));
    }
    lines.push(format!("sudo docker stop {container} 2>/dev/null || true"));
    lines.push(format!("sudo docker rm {container} 2>/dev/null || true"));

    let run_image = [
        format!("echo 'Building image {container}...'"),
        format!("sudo docker build -t {container} ."),
        format!("echo 'Starting container {container} on port {app_port}...'"),
        format!("sudo docker run -d --name {container} -p {app_port}:80 {container}"),
    ];

    match strategy {
        BuildStrategy::Compose(file) => {
            lines.push("echo 'Starting services with Docker Compose...'".to_string());
            lines.push(format!("sudo $COMPOSE -f {file} up -d --build"));
        }
        BuildStrategy::Dockerfile => lines.extend(run_image),
        BuildStrategy::Fallback => {
            lines.push("echo 'No Docker configuration found, using fallback image'".to_string());
            lines.push(format!("cat > Dockerfile <<'{EOF_MARKER}'"));
            lines.push(FALLBACK_DOCKERFILE.trim_end().to_string());
            lines.push(EOF_MARKER.to_string());
            lines.extend(run_image);
        }
    }

    lines.join("\n")
}

/// Script that stops the host Nginx so a container can publish port 80
///
/// Best effort: a host without a running Nginx is not an error.
pub fn release_port_80_script() -> String {
    [
        "sudo systemctl stop nginx 2>/dev/null || sudo service nginx stop 2>/dev/null || sudo nginx -s stop 2>/dev/null || true",
        "sudo systemctl disable nginx 2>/dev/null || true",
    ]
    .join("\n")
}

/// Path of the host Nginx site for a project
pub fn proxy_site_path(project: &str) -> String {
    format!("/etc/nginx/conf.d/{project}.conf")
}

/// Script that installs the host reverse-proxy site and reloads Nginx
pub fn proxy_script(project: &str, server_name: &str, app_port: u16) -> String {
    [
        "set -e".to_string(),
        format!(
            "sudo tee {} >/dev/null <<'{EOF_MARKER}'",
            proxy_site_path(project)
        ),
        proxy_site(server_name, app_port).trim_end().to_string(),
        EOF_MARKER.to_string(),
        "sudo nginx -t".to_string(),
        "sudo systemctl reload nginx 2>/dev/null || sudo service nginx reload 2>/dev/null || sudo nginx -s reload".to_string(),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn target() -> RemoteTarget {
        RemoteTarget::new("deploy", "10.0.0.5", "/keys/id")
    }

    #[test]
    fn test_detect_strategy() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(BuildStrategy::detect(dir.path()), BuildStrategy::Fallback);

        fs::write(dir.path().join("Dockerfile"), "FROM scratch\n").unwrap();
        assert_eq!(BuildStrategy::detect(dir.path()), BuildStrategy::Dockerfile);

        fs::write(dir.path().join("docker-compose.yml"), "services: {}\n").unwrap();
        assert_eq!(
            BuildStrategy::detect(dir.path()),
            BuildStrategy::Compose("docker-compose.yml".to_string())
        );
    }

    #[test]
    fn test_transfer_command_mirrors_with_deletes() {
        let spec = transfer_command(Path::new("/work/app"), &target(), "/home/deploy/app");
        let line = spec.command_line();

        assert_eq!(spec.program, "rsync");
        assert!(line.contains("--delete"));
        for exclude in SYNC_EXCLUDES {
            assert!(line.contains(&format!("--exclude {exclude}")));
        }
        assert!(line.contains("-i '/keys/id'"));
        assert!(line.ends_with("/work/app/ deploy@10.0.0.5:/home/deploy/app/"));
    }

    #[test]
    fn test_dockerfile_script_publishes_app_port() {
        let script = build_script(&BuildStrategy::Dockerfile, "/home/deploy/app", "app_app", 9090);
        assert!(script.starts_with("set -e\ncd '/home/deploy/app'"));
        assert!(script.contains("sudo docker stop app_app 2>/dev/null || true"));
        assert!(script.contains("sudo docker rm app_app 2>/dev/null || true"));
        assert!(script.contains("sudo docker build -t app_app ."));
        assert!(script.contains("sudo docker run -d --name app_app -p 9090:80 app_app"));
        assert!(!script.contains("up -d --build"));
    }

    #[test]
    fn test_compose_script_replaces_stack() {
        let strategy = BuildStrategy::Compose("compose.yaml".to_string());
        let script = build_script(&strategy, "/home/deploy/app", "app_app", 8080);
        let down = script.find("-f compose.yaml down").unwrap();
        let up = script.find("-f compose.yaml up -d --build").unwrap();
        assert!(down < up);
        assert!(!script.contains("docker build"));
    }

    #[test]
    fn test_fallback_script_writes_dockerfile() {
        let script = build_script(&BuildStrategy::Fallback, "/home/deploy/app", "app_app", 8080);
        assert!(script.contains("cat > Dockerfile <<'DOCKSHIP_EOF'\nFROM nginx:alpine"));
        assert!(script.contains("sudo docker run -d --name app_app -p 8080:80 app_app"));
        let heredoc = script.find("cat > Dockerfile").unwrap();
        let build = script.find("docker build").unwrap();
        assert!(heredoc < build);
    }

    #[test]
    fn test_release_port_80_stops_nginx() {
        let script = release_port_80_script();
        assert!(script.starts_with("sudo systemctl stop nginx"));
        assert!(script.contains("sudo systemctl disable nginx"));
        assert!(script.lines().all(|line| line.ends_with("|| true")));
    }

    #[test]
    fn test_proxy_script() {
        let script = proxy_script("app", "10.0.0.5", 9090);
        assert!(script.contains("sudo tee /etc/nginx/conf.d/app.conf"));
        assert!(script.contains("proxy_pass http://127.0.0.1:9090;"));
        assert!(script.contains("sudo nginx -t"));
    }
}
