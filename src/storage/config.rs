//! Configuration handling for solflat
//!
//! Configuration is stored in `solflat.toml` (project root) and
//! `~/.config/solflat/config.toml` (global).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{PostProcessor, ABI_ENCODER_V2, DEFAULT_LICENSE};

/// Name of the project configuration file
pub const CONFIG_FILE: &str = "solflat.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Source and library locations, relative to the project root
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory scanned when no files are given
    pub sources: PathBuf,

    /// Directory holding installed library packages
    pub libraries: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            sources: PathBuf::from("contracts"),
            libraries: PathBuf::from("node_modules"),
        }
    }
}

/// Settings for the flattened artifact
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FlattenConfig {
    /// License declared in the artifact header
    pub license_header: String,

    /// Directives kept only at their first occurrence
    pub one_time_directives: Vec<String>,

    /// File extensions picked up during discovery
    pub extensions: Vec<String>,
}

impl Default for FlattenConfig {
    fn default() -> Self {
        Self {
            license_header: DEFAULT_LICENSE.to_string(),
            one_time_directives: vec![ABI_ENCODER_V2.to_string()],
            extensions: vec!["sol".to_string()],
        }
    }
}

impl FlattenConfig {
    /// Builds the post-processing passes for these settings
    pub fn post_processor(&self) -> PostProcessor {
        PostProcessor::new(self.license_header.clone(), self.one_time_directives.clone())
    }
}

/// Project-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ProjectConfig {
    pub paths: PathsConfig,
    pub flatten: FlattenConfig,
}

impl ProjectConfig {
    /// Checks values that parse fine but cannot be used
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.flatten.license_header.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "flatten.license_header cannot be empty".to_string(),
            ));
        }
        if self.flatten.extensions.is_empty() {
            return Err(ConfigError::Invalid(
                "flatten.extensions must list at least one extension".to_string(),
            ));
        }
        if self.paths.sources.is_absolute() || self.paths.libraries.is_absolute() {
            return Err(ConfigError::Invalid(
                "paths must be relative to the project root".to_string(),
            ));
        }
        Ok(())
    }
}

/// Global user configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GlobalConfig {
    /// Default output format (text or json)
    pub default_format: OutputFormat,
}

/// Output format for commands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Combined configuration (global + project)
#[derive(Debug, Clone)]
pub struct Config {
    pub project: ProjectConfig,
    pub global: GlobalConfig,
    pub project_root: Option<PathBuf>,
}

impl Config {
    /// Loads configuration for a specific project
    pub fn for_project(project_root: &Path) -> Result<Self> {
        let global = Self::load_global()?;
        let project = Self::load_project_config(project_root)?;

        Ok(Self {
            project,
            global,
            project_root: Some(project_root.to_path_buf()),
        })
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "solflat", "solflat").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Loads global configuration
    pub fn load_global() -> Result<GlobalConfig> {
        let config_dir = match Self::global_config_dir() {
            Some(dir) => dir,
            None => return Ok(GlobalConfig::default()),
        };

        let config_path = config_dir.join("config.toml");
        if !config_path.exists() {
            return Ok(GlobalConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read global config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse global config")
    }

    /// Loads project configuration from a specific root
    ///
    /// A missing `solflat.toml` yields the defaults.
    pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
        let config_path = project_root.join(CONFIG_FILE);

        if !config_path.exists() {
            return Ok(ProjectConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read project config: {}", config_path.display()))?;

        let config: ProjectConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse project config")?;

        config
            .validate()
            .with_context(|| format!("Invalid project config: {}", config_path.display()))?;

        Ok(config)
    }

    /// Finds the project root by looking for `solflat.toml` in `start` or a parent
    pub fn find_project_root(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();

        loop {
            if current.join(CONFIG_FILE).is_file() {
                return Some(current);
            }

            if !current.pop() {
                return None;
            }
        }
    }

    /// Saves the project configuration
    pub fn save_project(&self) -> Result<()> {
        let root = self
            .project_root
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("No project root. Run 'solflat init' first."))?;
        let config_path = root.join(CONFIG_FILE);

        let content =
            toml::to_string_pretty(&self.project).context("Failed to serialize project config")?;

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write project config: {}", config_path.display()))
    }
}
