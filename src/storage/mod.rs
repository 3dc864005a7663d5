//! # Storage Layer
//!
//! Everything that touches the filesystem apart from writing the artifact.
//!
//! ## Project Structure
//!
//! ```text
//! project/
//! ├── solflat.toml          # Project configuration (optional)
//! ├── contracts/            # Sources discovered when no files are given
//! │   └── Token.sol
//! └── node_modules/         # Installed libraries
//!     └── @openzeppelin/contracts/
//!         ├── package.json  # Provides the library version
//!         └── access/Ownable.sol
//! ```
//!
//! ## Key Types
//!
//! - [`Project`] - Entry point for a project directory
//! - [`FsResolver`] - Reads sources and follows their imports
//! - [`Config`] - Project and global configuration

mod config;
mod project;
mod resolver;

pub use config::{
    Config, ConfigError, FlattenConfig, GlobalConfig, OutputFormat, PathsConfig, ProjectConfig,
    CONFIG_FILE,
};
pub use project::{Project, ProjectError};
pub use resolver::FsResolver;
