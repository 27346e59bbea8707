//! Configuration loading and storage root resolution

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the storage root
pub const STORAGE_ROOT_ENV: &str = "SIGHTLINE_STORAGE_ROOT";
/// Environment variable naming the database file
pub const DATABASE_PATH_ENV: &str = "SIGHTLINE_DATABASE_PATH";

/// On-disk TOML configuration file contents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Directory under which submission working trees are kept
    pub storage_root: Option<String>,
    /// SQLite database file location
    pub database_path: Option<String>,
    /// MIME types accepted for asset management
    pub accepted_mime_types: Option<Vec<String>>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// tracing filter directive, e.g. "info" or "sightline_ingest=debug"
    pub level: Option<String>,
}

/// Fully resolved configuration used by the ingest services
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub storage_root: PathBuf,
    pub database_path: PathBuf,
    pub accepted_mime_types: Vec<String>,
    pub log_filter: String,
}

impl IngestConfig {
    /// Resolve configuration with priority:
    /// 1. Command-line argument (highest)
    /// 2. Environment variable
    /// 3. TOML config file
    /// 4. OS-dependent compiled default (fallback)
    pub fn resolve(cli_storage_root: Option<&str>, cli_config_path: Option<&Path>) -> Result<Self> {
        let file_config = load_toml_config(cli_config_path)?;

        let storage_root = resolve_storage_root(cli_storage_root, &file_config);

        let database_path = std::env::var(DATABASE_PATH_ENV)
            .ok()
            .map(PathBuf::from)
            .or_else(|| file_config.database_path.as_ref().map(PathBuf::from))
            .unwrap_or_else(|| storage_root.join("sightline.db"));

        let accepted_mime_types = file_config
            .accepted_mime_types
            .clone()
            .unwrap_or_else(default_accepted_mime_types);

        if accepted_mime_types.is_empty() {
            return Err(Error::Config(
                "accepted_mime_types must name at least one MIME type".to_string(),
            ));
        }

        let log_filter = file_config
            .logging
            .level
            .clone()
            .unwrap_or_else(|| "info".to_string());

        Ok(Self {
            storage_root,
            database_path,
            accepted_mime_types,
            log_filter,
        })
    }
}

/// Default whitelist: camera still and motion formats
pub fn default_accepted_mime_types() -> Vec<String> {
    [
        "image/jpeg",
        "image/png",
        "image/gif",
        "image/bmp",
        "image/tiff",
        "image/webp",
        "video/mp4",
        "video/quicktime",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Resolve the storage root following the CLI → ENV → TOML → default chain
pub fn resolve_storage_root(cli_arg: Option<&str>, file_config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    if let Ok(path) = std::env::var(STORAGE_ROOT_ENV) {
        return PathBuf::from(path);
    }

    if let Some(path) = &file_config.storage_root {
        return PathBuf::from(path);
    }

    default_storage_root()
}

/// Load the TOML config file.
///
/// An explicitly supplied path must exist and parse; otherwise the platform
/// default locations are probed and a missing file falls back to defaults.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            path.to_path_buf()
        }
        None => match default_config_file() {
            Some(path) => path,
            None => return Ok(TomlConfig::default()),
        },
    };

    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
}

/// First existing config file among the platform default locations
fn default_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("sightline").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    let system_config = PathBuf::from("/etc/sightline/config.toml");
    if system_config.exists() {
        return Some(system_config);
    }

    None
}

/// OS-dependent default storage root
fn default_storage_root() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("sightline"))
        .unwrap_or_else(|| PathBuf::from("./sightline_data"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_whitelist_covers_camera_formats() {
        let accepted = default_accepted_mime_types();
        assert!(accepted.contains(&"image/jpeg".to_string()));
        assert!(accepted.contains(&"video/mp4".to_string()));
        assert!(!accepted.contains(&"application/x-msdownload".to_string()));
    }

    #[test]
    fn cli_argument_beats_file_config() {
        let file_config = TomlConfig {
            storage_root: Some("/from/file".to_string()),
            ..Default::default()
        };
        let resolved = resolve_storage_root(Some("/from/cli"), &file_config);
        assert_eq!(resolved, PathBuf::from("/from/cli"));
    }

    #[test]
    fn explicit_missing_config_file_is_an_error() {
        let result = load_toml_config(Some(Path::new("/nonexistent/sightline.toml")));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
