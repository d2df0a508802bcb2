//! Remote host provisioning
//!
//! Detects the Linux distribution and installs Docker, Docker Compose and
//! Nginx when they are missing. Each tool is probed first, so re-running
//! against a provisioned host changes nothing.

use super::error::HostError;
use super::ssh::RemoteShell;

/// Linux distribution family
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DistroFamily {
    /// Debian, Ubuntu, and derivatives (apt-based)
    Debian,
    /// RHEL, CentOS, Fedora, Amazon Linux (dnf/yum-based)
    RedHat,
    /// Alpine Linux (apk-based)
    Alpine,
    /// Arch Linux (pacman-based)
    Arch,
    /// SUSE/openSUSE (zypper-based)
    Suse,
    /// Unknown distribution
    Unknown(String),
}

impl std::fmt::Display for DistroFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DistroFamily::Debian => write!(f, "Debian/Ubuntu"),
            DistroFamily::RedHat => write!(f, "RHEL/Amazon Linux"),
            DistroFamily::Alpine => write!(f, "Alpine"),
            DistroFamily::Arch => write!(f, "Arch"),
            DistroFamily::Suse => write!(f, "SUSE"),
            DistroFamily::Unknown(id) => write!(f, "Unknown ({})", id),
        }
    }
}

/// Detected distribution information
#[derive(Debug, Clone)]
pub struct DistroInfo {
    pub family: DistroFamily,
    /// Distribution ID (e.g., "ubuntu", "amzn", "debian")
    pub id: String,
    /// Pretty name (e.g., "Ubuntu 22.04.3 LTS")
    pub pretty_name: String,
}

/// Package manager and init system commands for one distribution family
#[derive(Debug, Clone, PartialEq, Eq)]
struct PackageCommands {
    refresh: &'static str,
    install: &'static str,
    docker_package: &'static str,
    openrc: bool,
}

impl PackageCommands {
    fn for_family(family: &DistroFamily) -> Result<Self, HostError> {
        match family {
            DistroFamily::Debian => Ok(Self {
                refresh: "sudo apt-get update -y",
                install: "sudo DEBIAN_FRONTEND=noninteractive apt-get install -y",
                docker_package: "docker.io",
                openrc: false,
            }),
            DistroFamily::RedHat => Ok(Self {
                refresh: "(sudo dnf makecache -y || sudo yum makecache -y)",
                install: "sudo yum install -y",
                docker_package: "docker",
                openrc: false,
            }),
            DistroFamily::Alpine => Ok(Self {
                refresh: "sudo apk update",
                install: "sudo apk add",
                docker_package: "docker",
                openrc: true,
            }),
            DistroFamily::Arch => Ok(Self {
                refresh: "sudo pacman -Sy --noconfirm",
                install: "sudo pacman -S --noconfirm --needed",
                docker_package: "docker",
                openrc: false,
            }),
            DistroFamily::Suse => Ok(Self {
                refresh: "sudo zypper --non-interactive refresh",
                install: "sudo zypper --non-interactive install",
                docker_package: "docker",
                openrc: false,
            }),
            DistroFamily::Unknown(id) => Err(HostError::UnsupportedDistro(id.clone())),
        }
    }

    fn enable_and_start(&self, service: &str) -> String {
        if self.openrc {
            format!("sudo rc-update add {service} default && sudo service {service} start")
        } else {
            format!("sudo systemctl enable {service} && sudo systemctl start {service}")
        }
    }
}

/// Detect the Linux distribution on the remote host
pub fn detect_distro(shell: &RemoteShell<'_>) -> Result<DistroInfo, HostError> {
    let output = shell.run_checked("Distribution detection", "cat /etc/os-release")?;

    parse_os_release(&output)
}

/// Parse /etc/os-release content into DistroInfo
fn parse_os_release(content: &str) -> Result<DistroInfo, HostError> {
    let mut id = String::new();
    let mut id_like = String::new();
    let mut pretty_name = String::new();

    for line in content.lines() {
        if let Some((key, value)) = line.split_once('=') {
            let value = value.trim_matches('"');
            match key {
                "ID" => id = value.to_lowercase(),
                "ID_LIKE" => id_like = value.to_lowercase(),
                "PRETTY_NAME" => pretty_name = value.to_string(),
                _ => {}
            }
        }
    }

    if id.is_empty() {
        return Err(HostError::UnsupportedDistro(
            "could not read ID from /etc/os-release".to_string(),
        ));
    }

    let family = match id.as_str() {
        "ubuntu" | "debian" | "linuxmint" | "pop" | "raspbian" => DistroFamily::Debian,
        "amzn" | "rhel" | "centos" | "fedora" | "rocky" | "almalinux" | "ol" => {
            DistroFamily::RedHat
        }
        "alpine" => DistroFamily::Alpine,
        "arch" | "manjaro" | "endeavouros" => DistroFamily::Arch,
        "opensuse" | "sles" | "opensuse-leap" | "opensuse-tumbleweed" => DistroFamily::Suse,
        _ => {
            if id_like.contains("debian") || id_like.contains("ubuntu") {
                DistroFamily::Debian
            } else if id_like.contains("rhel")
                || id_like.contains("fedora")
                || id_like.contains("centos")
            {
                DistroFamily::RedHat
            } else if id_like.contains("arch") {
                DistroFamily::Arch
            } else if id_like.contains("suse") {
                DistroFamily::Suse
            } else {
                DistroFamily::Unknown(id.clone())
            }
        }
    };

    Ok(DistroInfo {
        family,
        id,
        pretty_name,
    })
}

/// Build the idempotent provisioning script for a distribution
pub fn provisioning_script(distro: &DistroInfo) -> Result<String, HostError> {
    let pkg = PackageCommands::for_family(&distro.family)?;

    let lines = [
        "set -e".to_string(),
        "echo 'Refreshing package index...'".to_string(),
        pkg.refresh.to_string(),
        "if ! command -v docker >/dev/null 2>&1; then".to_string(),
        "  echo 'Installing Docker...'".to_string(),
        format!("  {} {}", pkg.install, pkg.docker_package),
        format!("  {}", pkg.enable_and_start("docker")),
        "else".to_string(),
        "  echo 'Docker already installed'".to_string(),
        "fi".to_string(),
        "if ! command -v docker-compose >/dev/null 2>&1 && ! docker compose version >/dev/null 2>&1; then".to_string(),
        "  echo 'Installing Docker Compose...'".to_string(),
        "  sudo curl -fsSL \"https://github.com/docker/compose/releases/latest/download/docker-compose-$(uname -s)-$(uname -m)\" -o /usr/local/bin/docker-compose".to_string(),
        "  sudo chmod +x /usr/local/bin/docker-compose".to_string(),
        "else".to_string(),
        "  echo 'Docker Compose already installed'".to_string(),
        "fi".to_string(),
        "if ! command -v nginx >/dev/null 2>&1; then".to_string(),
        "  echo 'Installing Nginx...'".to_string(),
        format!("  {} nginx", pkg.install),
        format!("  {}", pkg.enable_and_start("nginx")),
        "else".to_string(),
        "  echo 'Nginx already installed'".to_string(),
        "fi".to_string(),
        "sudo usermod -aG docker \"$USER\" 2>/dev/null || sudo addgroup \"$USER\" docker 2>/dev/null || true".to_string(),
        "docker --version".to_string(),
        "docker-compose --version 2>/dev/null || docker compose version".to_string(),
        "nginx -v 2>&1".to_string(),
    ];

    Ok(lines.join("\n"))
}

/// Provision the remote host
///
/// Streams the remote script's output through `on_output`. Any failing
/// step aborts the script and is returned as an error.
pub fn provision_host(
    shell: &RemoteShell<'_>,
    on_output: &mut dyn FnMut(&str),
) -> Result<DistroInfo, HostError> {
    let distro = detect_distro(shell)?;
    on_output(&format!(
        "Provisioning {} host ({})",
        distro.family,
        if distro.pretty_name.is_empty() {
            distro.id.as_str()
        } else {
            distro.pretty_name.as_str()
        }
    ));

    let script = provisioning_script(&distro)?;
    shell.stream_checked("Provisioning", &script, on_output)?;

    Ok(distro)
}
