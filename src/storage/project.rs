//! Project management
//!
//! Locates the project root, loads its configuration, and wires up the
//! filesystem resolver and flattener.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use super::config::{Config, CONFIG_FILE};
use super::resolver::FsResolver;
use crate::flatten::Flattener;

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Project root does not exist: {0}")]
    RootMissing(PathBuf),

    #[error("Project root is not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// A solflat project
pub struct Project {
    root: PathBuf,
    config: Config,
}

impl Project {
    /// Opens the project at the given root
    ///
    /// The root does not need a `solflat.toml`; defaults are used without one.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        if !root.exists() {
            return Err(ProjectError::RootMissing(root).into());
        }
        if !root.is_dir() {
            return Err(ProjectError::NotADirectory(root).into());
        }

        let config = Config::for_project(&root)?;

        Ok(Self { root, config })
    }

    /// Opens the project containing the current directory
    ///
    /// Walks up looking for `solflat.toml`, falling back to the current
    /// directory itself.
    pub fn open_current() -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to read current directory")?;
        let root = Config::find_project_root(&cwd).unwrap_or(cwd);

        Self::open(root)
    }

    /// Initializes a new project at the given path
    ///
    /// Existing files are left untouched.
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create project directory: {}", root.display()))?;

        let config = Config::for_project(&root)?;

        let config_path = root.join(CONFIG_FILE);
        if !config_path.exists() {
            config.save_project()?;
        }

        let sources_dir = root.join(&config.project.paths.sources);
        fs::create_dir_all(&sources_dir).with_context(|| {
            format!(
                "Failed to create sources directory: {}",
                sources_dir.display()
            )
        })?;

        Ok(Self { root, config })
    }

    /// Returns the project root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the path of `solflat.toml`
    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    /// Returns the project configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns a resolver for this project's sources
    pub fn resolver(&self) -> FsResolver {
        FsResolver::from_config(&self.root, &self.config.project)
    }

    /// Returns a flattener using this project's resolver and settings
    pub fn flattener(&self) -> Flattener<FsResolver> {
        Flattener::with_post_processor(
            self.resolver(),
            self.config.project.flatten.post_processor(),
        )
    }
}
