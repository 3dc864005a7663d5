//! Resolved source files and the resolver contract

use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;
use thiserror::Error;

use super::id::{SourceName, SourceNameError};

/// Package a library source file was loaded from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LibraryInfo {
    pub name: String,
    pub version: String,
}

/// A source file as returned by a [`Resolver`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFile {
    /// Canonical identity
    pub name: SourceName,

    /// Location on disk
    pub path: PathBuf,

    /// Unmodified file content
    #[serde(skip)]
    pub content: String,

    /// Set when the file comes from an installed library
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library: Option<LibraryInfo>,

    /// Direct dependencies (files this one imports)
    pub dependencies: BTreeSet<SourceName>,
}

impl SourceFile {
    /// Creates a local (non-library) source file with no dependencies
    pub fn new(name: SourceName, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            name,
            path: path.into(),
            content: content.into(),
            library: None,
            dependencies: BTreeSet::new(),
        }
    }

    /// Marks the file as belonging to a library
    pub fn with_library(mut self, library: LibraryInfo) -> Self {
        self.library = Some(library);
        self
    }

    /// Adds a direct dependency
    pub fn add_dependency(&mut self, dependency: SourceName) {
        self.dependencies.insert(dependency);
    }

    /// Label used in provenance comments: `<name>` or `<name>@v<version>`
    pub fn versioned_name(&self) -> String {
        match &self.library {
            Some(library) => format!("{}@v{}", self.name, library.version),
            None => self.name.to_string(),
        }
    }

    /// Returns true if the file was loaded from a library
    pub fn is_library(&self) -> bool {
        self.library.is_some()
    }
}

/// Which files to resolve
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FileSelection {
    /// Every source file the resolver can discover
    #[default]
    All,

    /// Explicit entry files (absolute, or relative to the working directory)
    Files(Vec<PathBuf>),
}

impl FileSelection {
    /// `All` for an empty list, `Files` otherwise
    pub fn from_paths(paths: Vec<PathBuf>) -> Self {
        if paths.is_empty() {
            FileSelection::All
        } else {
            FileSelection::Files(paths)
        }
    }
}

/// Output of a resolver: every reachable file, in resolution order
#[derive(Debug, Clone, Default)]
pub struct ResolvedSources {
    files: Vec<SourceFile>,
}

impl ResolvedSources {
    pub fn new(files: Vec<SourceFile>) -> Self {
        Self { files }
    }

    /// Files in resolution order (entries first, then discovery order)
    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn get(&self, name: &SourceName) -> Option<&SourceFile> {
        self.files.iter().find(|f| &f.name == name)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn into_files(self) -> Vec<SourceFile> {
        self.files
    }
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("File {path} is outside the project root {root}")]
    OutsideProject { path: PathBuf, root: PathBuf },

    #[error("Invalid import '{import}' in {from}: {reason}")]
    InvalidImport {
        import: String,
        from: SourceName,
        reason: SourceNameError,
    },

    #[error("Imported file '{import}' not found (imported from {from})")]
    ImportNotFound { import: String, from: SourceName },

    #[error("Library '{library}' is not installed (imported from {from})")]
    LibraryNotInstalled { library: String, from: SourceName },

    #[error("Invalid package manifest for library '{library}': {reason}")]
    InvalidLibraryManifest { library: String, reason: String },

    #[error("{dependent} depends on {dependency}, which was not resolved")]
    MissingDependency {
        dependent: SourceName,
        dependency: SourceName,
    },

    #[error("Invalid source name: {0}")]
    InvalidName(#[from] SourceNameError),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Turns a file selection into resolved sources
///
/// Implementations must return every file reachable from the selection.
pub trait Resolver {
    fn resolve(&self, selection: &FileSelection) -> Result<ResolvedSources, ResolveError>;
}

impl<R: Resolver + ?Sized> Resolver for &R {
    fn resolve(&self, selection: &FileSelection) -> Result<ResolvedSources, ResolveError> {
        (**self).resolve(selection)
    }
}
