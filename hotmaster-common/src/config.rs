//! Configuration loading and data folder resolution
//!
//! Data folder priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent default (fallback)
//!
//! A missing TOML file is never fatal: a warning is logged and defaults apply.

use crate::fade::FadeCurve;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable consulted for the data folder
pub const DATA_DIR_ENV: &str = "HOTMASTER_DATA_DIR";

/// Contents of the optional `hotmaster.toml` file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TomlConfig {
    /// Folder holding uploads, results and previews
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// HTTP port (CLI and environment take precedence)
    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub preview: PreviewSettings,

    #[serde(default)]
    pub engine: EngineSettings,
}

/// Logging section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Preview extraction section, expressed in seconds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PreviewSettings {
    /// Length of each preview clip
    pub size_seconds: f64,
    /// Hop between candidate windows when searching for the loudest region
    pub analysis_step_seconds: f64,
    /// Upper bound for the fade at each clip edge
    pub fade_seconds: f64,
    /// The fade never exceeds clip length divided by this value
    pub fade_coefficient: u32,
    pub fade_curve: FadeCurve,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            size_seconds: 30.0,
            analysis_step_seconds: 5.0,
            fade_seconds: 1.0,
            fade_coefficient: 8,
            fade_curve: FadeCurve::Linear,
        }
    }
}

/// Engine section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineSettings {
    /// Every track is resampled to this rate before processing
    pub internal_sample_rate: u32,
    /// Tracks longer than this are rejected
    pub max_length_seconds: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            internal_sample_rate: 44100,
            max_length_seconds: 15.0 * 60.0,
        }
    }
}

/// Load a TOML config file, falling back to defaults when it does not exist
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        warn!(
            path = %path.display(),
            "Config file not found, using defaults"
        );
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;

    info!(path = %path.display(), "Loaded config file");
    Ok(config)
}

/// Write a TOML config file (used by tooling and tests)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}

/// Default config file location: `<config dir>/hotmaster/hotmaster.toml`
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("hotmaster").join("hotmaster.toml"))
        .unwrap_or_else(|| PathBuf::from("hotmaster.toml"))
}

/// Resolve the data folder: CLI → environment → TOML → OS default
pub fn resolve_data_folder(cli_arg: Option<&Path>, toml_config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(DATA_DIR_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &toml_config.data_dir {
        return path.clone();
    }

    default_data_folder()
}

/// OS-dependent default data folder
pub fn default_data_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("hotmaster"))
        .unwrap_or_else(|| PathBuf::from("./hotmaster_data"))
}

/// The three top-level storage folders under the data folder
#[derive(Debug, Clone)]
pub struct DataFolders {
    pub root: PathBuf,
    pub uploads: PathBuf,
    pub results: PathBuf,
    pub previews: PathBuf,
}

impl DataFolders {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            uploads: root.join("uploads"),
            results: root.join("results"),
            previews: root.join("previews"),
            root,
        }
    }

    /// Create every folder that does not exist yet
    pub fn ensure_exists(&self) -> Result<()> {
        for dir in [&self.root, &self.uploads, &self.results, &self.previews] {
            if !dir.exists() {
                std::fs::create_dir_all(dir).map_err(|e| {
                    Error::Config(format!("Failed to create {}: {}", dir.display(), e))
                })?;
                info!(path = %dir.display(), "Created data folder");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_folders_layout() {
        let folders = DataFolders::new("/srv/hotmaster");
        assert_eq!(folders.uploads, PathBuf::from("/srv/hotmaster/uploads"));
        assert_eq!(folders.results, PathBuf::from("/srv/hotmaster/results"));
        assert_eq!(folders.previews, PathBuf::from("/srv/hotmaster/previews"));
    }

    #[test]
    fn test_partial_toml_uses_section_defaults() {
        let config: TomlConfig = toml::from_str(
            r#"
            port = 9000

            [preview]
            size_seconds = 10.0
            "#,
        )
        .unwrap();

        assert_eq!(config.port, Some(9000));
        assert_eq!(config.preview.size_seconds, 10.0);
        assert_eq!(config.preview.analysis_step_seconds, 5.0);
        assert_eq!(config.preview.fade_coefficient, 8);
        assert_eq!(config.engine.internal_sample_rate, 44100);
        assert_eq!(config.logging.level, "info");
    }
}
