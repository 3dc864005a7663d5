//! Filesystem resolver
//!
//! Reads source files from a project tree and follows their imports.
//!
//! ## Import Resolution
//!
//! | Import | Resolved against |
//! |--------|------------------|
//! | `./x.sol`, `../x.sol` | Directory of the importing file |
//! | `contracts/x.sol` (exists under the root) | Project root |
//! | `@scope/pkg/x.sol`, `pkg/x.sol` | Library directory (`node_modules`) |
//!
//! Relative imports inside a library file stay inside the library directory.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;
use walkdir::WalkDir;

use super::config::ProjectConfig;
use crate::domain::{
    import_paths, FileSelection, LibraryInfo, ResolveError, ResolvedSources, Resolver,
    SourceFile, SourceName,
};

/// The subset of `package.json` needed for versioned names
#[derive(Debug, Deserialize)]
struct PackageManifest {
    version: String,
}

/// Resolves sources from a project directory
#[derive(Debug, Clone)]
pub struct FsResolver {
    root: PathBuf,
    sources_dir: PathBuf,
    libraries_dir: PathBuf,
    extensions: Vec<String>,
}

impl FsResolver {
    /// Creates a resolver with default locations (`contracts/`, `node_modules/`)
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::from_config(root, &ProjectConfig::default())
    }

    /// Creates a resolver using the paths from a project config
    pub fn from_config(root: impl Into<PathBuf>, config: &ProjectConfig) -> Self {
        let root = root.into();
        let root = root.canonicalize().unwrap_or(root);
        Self {
            sources_dir: root.join(&config.paths.sources),
            libraries_dir: root.join(&config.paths.libraries),
            extensions: config.flatten.extensions.clone(),
            root,
        }
    }

    /// Lists every source file under the sources directory, sorted by path
    ///
    /// The library directory is never walked, even when it sits inside the
    /// sources directory; library files only enter through imports.
    pub fn discover(&self) -> Result<Vec<PathBuf>, ResolveError> {
        if !self.sources_dir.is_dir() {
            debug!(dir = %self.sources_dir.display(), "sources directory missing, nothing to discover");
            return Ok(Vec::new());
        }

        let mut found = Vec::new();
        let walker = WalkDir::new(&self.sources_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.path() != self.libraries_dir.as_path());

        for entry in walker {
            let entry = entry.map_err(|e| ResolveError::Io {
                path: e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| self.sources_dir.clone()),
                source: e.into(),
            })?;

            if entry.file_type().is_file() && self.has_source_extension(entry.path()) {
                found.push(entry.into_path());
            }
        }

        debug!(count = found.len(), "discovered source files");
        Ok(found)
    }

    fn has_source_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.iter().any(|allowed| allowed == ext))
            .unwrap_or(false)
    }

    /// Converts an entry path to its source name
    ///
    /// Relative paths are taken from the current directory. The file must
    /// exist and lie inside the project root.
    pub fn entry_name(&self, path: &Path) -> Result<SourceName, ResolveError> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(|source| ResolveError::Io {
                    path: path.to_path_buf(),
                    source,
                })?
                .join(path)
        };

        if !absolute.is_file() {
            return Err(ResolveError::FileNotFound(path.to_path_buf()));
        }

        let canonical = absolute.canonicalize().map_err(|source| ResolveError::Io {
            path: absolute.clone(),
            source,
        })?;

        let relative = canonical
            .strip_prefix(&self.root)
            .map_err(|_| ResolveError::OutsideProject {
                path: path.to_path_buf(),
                root: self.root.clone(),
            })?;

        Ok(SourceName::from_relative_path(relative)?)
    }

    /// Resolves an import found in `importer` to a source name
    fn resolve_import(
        &self,
        importer: &SourceFile,
        import: &str,
    ) -> Result<SourceName, ResolveError> {
        let invalid = |reason| ResolveError::InvalidImport {
            import: import.to_string(),
            from: importer.name.clone(),
            reason,
        };

        if import.starts_with("./") || import.starts_with("../") {
            return importer.name.join_relative(import).map_err(invalid);
        }

        SourceName::new(import).map_err(invalid)
    }

    /// Loads a file by source name, deciding between the project and a library
    fn load(
        &self,
        name: &SourceName,
        from: &SourceFile,
        relative: bool,
        manifests: &mut HashMap<String, LibraryInfo>,
    ) -> Result<SourceFile, ResolveError> {
        let stays_in_library = relative && from.is_library();

        if !stays_in_library {
            let local = self.root.join(name.as_str());
            if local.is_file() {
                return self.read(name.clone(), local, None);
            }
            if relative {
                return Err(ResolveError::ImportNotFound {
                    import: name.to_string(),
                    from: from.name.clone(),
                });
            }
        }

        let package = name.package().to_string();
        let package_dir = self.libraries_dir.join(&package);
        if !package_dir.is_dir() {
            return Err(ResolveError::LibraryNotInstalled {
                library: package,
                from: from.name.clone(),
            });
        }

        let path = self.libraries_dir.join(name.as_str());
        if !path.is_file() {
            return Err(ResolveError::ImportNotFound {
                import: name.to_string(),
                from: from.name.clone(),
            });
        }

        let library = match manifests.get(&package) {
            Some(info) => info.clone(),
            None => {
                let info = self.read_manifest(&package, &package_dir)?;
                manifests.insert(package, info.clone());
                info
            }
        };

        self.read(name.clone(), path, Some(library))
    }

    fn read_manifest(&self, package: &str, package_dir: &Path) -> Result<LibraryInfo, ResolveError> {
        let manifest_path = package_dir.join("package.json");
        let invalid = |reason: String| ResolveError::InvalidLibraryManifest {
            library: package.to_string(),
            reason,
        };

        let content = fs::read_to_string(&manifest_path)
            .map_err(|e| invalid(format!("{}: {}", manifest_path.display(), e)))?;
        let manifest: PackageManifest =
            serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))?;

        Ok(LibraryInfo {
            name: package.to_string(),
            version: manifest.version,
        })
    }

    fn read(
        &self,
        name: SourceName,
        path: PathBuf,
        library: Option<LibraryInfo>,
    ) -> Result<SourceFile, ResolveError> {
        let content = fs::read_to_string(&path).map_err(|source| ResolveError::Io {
            path: path.clone(),
            source,
        })?;

        let file = SourceFile::new(name, path, content);
        Ok(match library {
            Some(library) => file.with_library(library),
            None => file,
        })
    }
}

impl Resolver for FsResolver {
    fn resolve(&self, selection: &FileSelection) -> Result<ResolvedSources, ResolveError> {
        let entries = match selection {
            FileSelection::All => self.discover()?,
            FileSelection::Files(paths) => paths.clone(),
        };

        let mut files: Vec<SourceFile> = Vec::new();
        let mut index: HashMap<SourceName, usize> = HashMap::new();
        let mut manifests: HashMap<String, LibraryInfo> = HashMap::new();
        let mut queue: VecDeque<usize> = VecDeque::new();

        for path in &entries {
            let name = self.entry_name(path)?;
            if index.contains_key(&name) {
                continue;
            }
            let file = self.read(name.clone(), self.root.join(name.as_str()), None)?;
            index.insert(name, files.len());
            queue.push_back(files.len());
            files.push(file);
        }

        while let Some(current) = queue.pop_front() {
            let mut seen_here = HashSet::new();
            let imports = import_paths(&files[current].content);

            for import in imports {
                if !seen_here.insert(import.clone()) {
                    continue;
                }

                let relative = import.starts_with("./") || import.starts_with("../");
                let name = self.resolve_import(&files[current], &import)?;

                if !index.contains_key(&name) {
                    let loaded = self.load(&name, &files[current], relative, &mut manifests)?;
                    debug!(source = %loaded.name, from = %files[current].name, "resolved import");
                    index.insert(name.clone(), files.len());
                    queue.push_back(files.len());
                    files.push(loaded);
                }

                files[current].add_dependency(name);
            }
        }

        debug!(count = files.len(), "resolution complete");
        Ok(ResolvedSources::new(files))
    }
}
