//! Canonical source names
//!
//! A source name is the stable identity of a resolved file and the key of
//! every node in the dependency graph.
//!
//! Format:
//! - Local files: path relative to the project root (e.g., `contracts/Token.sol`)
//! - Library files: path relative to the library root (e.g., `@openzeppelin/contracts/access/Ownable.sol`)
//!
//! Names always use `/` separators and never contain `.` or `..` segments.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SourceNameError {
    #[error("Source name cannot be empty")]
    Empty,

    #[error("Source name must be relative, got '{0}'")]
    Absolute(String),

    #[error("Source name must use '/' separators, got '{0}'")]
    Backslash(String),

    #[error("Source name escapes its root: '{0}'")]
    EscapesRoot(String),
}

/// Canonical identifier of a source file
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SourceName(String);

impl SourceName {
    /// Parses and normalizes a source name
    ///
    /// `.` segments and empty segments are dropped and `..` pops the previous
    /// segment. A `..` with nothing left to pop is an error.
    pub fn new(raw: &str) -> Result<Self, SourceNameError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(SourceNameError::Empty);
        }
        if raw.contains('\\') {
            return Err(SourceNameError::Backslash(raw.to_string()));
        }
        if raw.starts_with('/') {
            return Err(SourceNameError::Absolute(raw.to_string()));
        }

        let mut segments: Vec<&str> = Vec::new();
        for segment in raw.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    if segments.pop().is_none() {
                        return Err(SourceNameError::EscapesRoot(raw.to_string()));
                    }
                }
                other => segments.push(other),
            }
        }

        if segments.is_empty() {
            return Err(SourceNameError::Empty);
        }

        Ok(Self(segments.join("/")))
    }

    /// Builds a source name from a path relative to some root
    pub fn from_relative_path(path: &Path) -> Result<Self, SourceNameError> {
        let mut parts = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
                Component::CurDir => {}
                Component::ParentDir => parts.push("..".to_string()),
                Component::RootDir | Component::Prefix(_) => {
                    return Err(SourceNameError::Absolute(path.display().to_string()));
                }
            }
        }
        Self::new(&parts.join("/"))
    }

    /// Resolves a relative import (`./x.sol`, `../y/z.sol`) against this name's directory
    pub fn join_relative(&self, import: &str) -> Result<Self, SourceNameError> {
        let dir = match self.0.rfind('/') {
            Some(idx) => &self.0[..idx],
            None => "",
        };
        if dir.is_empty() {
            Self::new(import)
        } else {
            Self::new(&format!("{}/{}", dir, import))
        }
    }

    /// Returns the name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the package portion of a library source name
    ///
    /// Scoped packages (`@scope/pkg/...`) use their first two segments.
    pub fn package(&self) -> &str {
        let mut boundary = self.0.find('/');
        if self.0.starts_with('@') {
            boundary = boundary.and_then(|first| {
                self.0[first + 1..].find('/').map(|second| first + 1 + second)
            });
        }
        match boundary {
            Some(idx) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl fmt::Display for SourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SourceName {
    type Err = SourceNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for SourceName {
    type Error = SourceNameError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(&s)
    }
}

impl From<SourceName> for String {
    fn from(name: SourceName) -> Self {
        name.0
    }
}

impl AsRef<str> for SourceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
