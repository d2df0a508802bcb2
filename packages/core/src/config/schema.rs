//! Settings schema for dockship
//!
//! Defaults offered by the interactive prompts and timing knobs for the
//! post-deploy diagnostics. Every field is optional in the file.

use serde::Deserialize;

/// Contents of `~/.config/dockship/config.json`
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Settings file format version; newer than [`SETTINGS_VERSION`] is rejected
    #[serde(default = "default_version")]
    pub version: u32,

    /// Branch offered when the prompt is left empty (default: "main")
    #[serde(default = "default_branch")]
    pub default_branch: String,

    /// Application port offered when the prompt is left empty (default: 8080)
    #[serde(default = "default_app_port")]
    pub default_app_port: u16,

    /// SSH username offered when the prompt is left empty (default: none)
    #[serde(default)]
    pub default_ssh_user: Option<String>,

    /// SSH key offered when the prompt is left empty (default: "~/.ssh/id_rsa")
    #[serde(default = "default_ssh_key")]
    pub default_ssh_key: String,

    /// Seconds to wait after starting containers before diagnostics (default: 10)
    #[serde(default = "default_settle_delay")]
    pub settle_delay_secs: u64,

    /// Rounds of the reachability probe (default: 3)
    #[serde(default = "default_probe_attempts")]
    pub probe_attempts: u32,

    /// Seconds between probe rounds (default: 5)
    #[serde(default = "default_probe_interval")]
    pub probe_interval_secs: u64,

    /// Directory for run logs (default: current directory)
    #[serde(default)]
    pub log_dir: Option<String>,
}

/// Newest settings format this build understands
pub const SETTINGS_VERSION: u32 = 1;

fn default_version() -> u32 {
    SETTINGS_VERSION
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_app_port() -> u16 {
    8080
}

fn default_ssh_key() -> String {
    "~/.ssh/id_rsa".to_string()
}

fn default_settle_delay() -> u64 {
    10
}

fn default_probe_attempts() -> u32 {
    3
}

fn default_probe_interval() -> u64 {
    5
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            default_branch: default_branch(),
            default_app_port: default_app_port(),
            default_ssh_user: None,
            default_ssh_key: default_ssh_key(),
            settle_delay_secs: default_settle_delay(),
            probe_attempts: default_probe_attempts(),
            probe_interval_secs: default_probe_interval(),
            log_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.version, 1);
        assert_eq!(settings.default_branch, "main");
        assert_eq!(settings.default_app_port, 8080);
        assert_eq!(settings.default_ssh_key, "~/.ssh/id_rsa");
        assert!(settings.default_ssh_user.is_none());
        assert_eq!(settings.probe_attempts, 3);
    }

    #[test]
    fn test_deserialize_empty_object_uses_defaults() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_deserialize_partial() {
        let json = r#"{"default_branch": "develop", "default_app_port": 3000}"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.default_branch, "develop");
        assert_eq!(settings.default_app_port, 3000);
        assert_eq!(settings.settle_delay_secs, 10);
    }

    #[test]
    fn test_deserialize_rejects_unknown_fields() {
        let json = r#"{"default_brunch": "main"}"#;
        assert!(serde_json::from_str::<Settings>(json).is_err());
    }
}
