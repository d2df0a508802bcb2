//! Settings management for dockship
//!
//! Loads the optional JSONC settings file. A missing file yields defaults
//! and nothing is written: a deployment run must not touch the filesystem
//! before its parameters are validated.

pub mod paths;
pub mod schema;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use jsonc_parser::parse_to_serde_value;

pub use paths::{get_config_dir, get_config_path};
pub use schema::{SETTINGS_VERSION, Settings};

/// Load settings from the default location
pub fn load_settings() -> Result<Settings> {
    match get_config_path() {
        Some(path) => load_settings_from(&path),
        None => {
            tracing::debug!("No config directory on this platform, using defaults");
            Ok(Settings::default())
        }
    }
}

/// Load settings from an explicit path
///
/// Supports JSONC (JSON with comments) and rejects unknown fields.
pub fn load_settings_from(path: &Path) -> Result<Settings> {
    if !path.exists() {
        tracing::debug!("Settings file not found at {}, using defaults", path.display());
        return Ok(Settings::default());
    }

    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

    let parsed_value = parse_to_serde_value(&contents, &Default::default())
        .map_err(|e| anyhow::anyhow!("Invalid JSONC in settings file: {}", e))?
        .ok_or_else(|| anyhow::anyhow!("Settings file is empty"))?;

    let settings: Settings = serde_json::from_value(parsed_value).with_context(|| {
        format!(
            "Invalid settings in {}. Check for unknown fields or invalid values.",
            path.display()
        )
    })?;

    if settings.version > SETTINGS_VERSION {
        bail!(
            "Settings file {} has version {}, this build understands up to {}",
            path.display(),
            settings.version,
            SETTINGS_VERSION
        );
    }

    tracing::debug!("Loaded settings from {}", path.display());
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let settings = load_settings_from(&path).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(!path.exists());
    }

    #[test]
    fn test_jsonc_with_comments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{
                // deploy as the ops account
                "default_ssh_user": "ops",
                "settle_delay_secs": 2 /* faster diagnostics */
            }"#,
        )
        .unwrap();

        let settings = load_settings_from(&path).unwrap();
        assert_eq!(settings.default_ssh_user.as_deref(), Some("ops"));
        assert_eq!(settings.settle_delay_secs, 2);
    }

    #[test]
    fn test_unknown_field_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"bogus": true}"#).unwrap();
        assert!(load_settings_from(&path).is_err());
    }

    #[test]
    fn test_newer_settings_version_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"version": 2, "default_branch": "develop"}"#).unwrap();
        let err = load_settings_from(&path).unwrap_err();
        assert!(err.to_string().contains("has version 2"));

        fs::write(&path, r#"{"version": 1, "default_branch": "develop"}"#).unwrap();
        assert_eq!(load_settings_from(&path).unwrap().default_branch, "develop");
    }

    #[test]
    fn test_empty_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "").unwrap();
        assert!(load_settings_from(&path).is_err());
    }
}
