//! # Flattening
//!
//! Turns a set of interdependent source files into one self-contained text:
//!
//! 1. Resolve the selection through a [`Resolver`]
//! 2. Build the [`DependencyGraph`] and its topological order
//! 3. Strip imports from every file and concatenate, one `// File` block each
//! 4. Run the whole-artifact passes ([`PostProcessor`])
//! 5. Return the text, or persist it to a destination
//!
//! Every call builds its own graph; nothing is shared between calls.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::domain::{
    assemble, strip_imports, DependencyGraph, FileSelection, GraphError, PostProcessor,
    ResolveError, ResolvedSources, Resolver, SourceFile, SourceName,
};

#[derive(Debug, Error)]
pub enum FlattenError {
    #[error("Cyclic dependency detected involving {0}")]
    CyclicDependency(SourceName),

    #[error(transparent)]
    Resolution(#[from] ResolveError),

    #[error("Failed to write flattened source to {path}")]
    DestinationWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<GraphError> for FlattenError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::CyclicDependency(name) => FlattenError::CyclicDependency(name),
            GraphError::UnknownSource {
                source_name,
                dependency,
            } => FlattenError::Resolution(ResolveError::MissingDependency {
                dependent: source_name,
                dependency,
            }),
        }
    }
}

/// Flattens sources provided by a resolver
#[derive(Debug, Clone)]
pub struct Flattener<R> {
    resolver: R,
    post_processor: PostProcessor,
}

impl<R: Resolver> Flattener<R> {
    /// Creates a flattener with the default post-processing passes
    pub fn new(resolver: R) -> Self {
        Self::with_post_processor(resolver, PostProcessor::default())
    }

    pub fn with_post_processor(resolver: R, post_processor: PostProcessor) -> Self {
        Self {
            resolver,
            post_processor,
        }
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Resolves the selection and builds its dependency graph
    pub fn dependency_graph(
        &self,
        selection: &FileSelection,
    ) -> Result<(ResolvedSources, DependencyGraph), FlattenError> {
        let sources = self.resolver.resolve(selection)?;
        let graph = DependencyGraph::from_sources(sources.files())?;
        debug!(files = graph.len(), "built dependency graph");
        Ok((sources, graph))
    }

    /// Returns the resolved files in flatten order
    pub fn dependency_order(
        &self,
        selection: &FileSelection,
    ) -> Result<Vec<SourceFile>, FlattenError> {
        let (sources, graph) = self.dependency_graph(selection)?;
        let order = graph.topological_order()?;

        let mut by_name: HashMap<SourceName, SourceFile> = sources
            .into_files()
            .into_iter()
            .map(|f| (f.name.clone(), f))
            .collect();
        let ordered: Vec<SourceFile> = order.iter().filter_map(|name| by_name.remove(name)).collect();

        debug!(order = ?order.iter().map(SourceName::as_str).collect::<Vec<_>>(), "sorted sources");
        Ok(ordered)
    }

    /// Builds the flattened text for a selection
    ///
    /// An empty selection yields an empty string.
    pub fn flattened_source(&self, selection: &FileSelection) -> Result<String, FlattenError> {
        let files = self.dependency_order(selection)?;
        if files.is_empty() {
            debug!("no sources resolved, nothing to flatten");
            return Ok(String::new());
        }

        let bodies: Vec<String> = files.iter().map(|f| strip_imports(&f.content)).collect();
        let assembled = assemble(
            files
                .iter()
                .zip(bodies.iter())
                .map(|(file, body)| (file.versioned_name(), body.as_str())),
        );

        Ok(self.post_processor.apply(&assembled))
    }

    /// Flattens a selection
    ///
    /// Without a destination the text is returned. With one, the text is
    /// written there and the returned string is empty. Nothing is written
    /// when the selection resolves to no files or when any step fails.
    pub fn flatten(
        &self,
        selection: &FileSelection,
        destination: Option<&Path>,
    ) -> Result<String, FlattenError> {
        match destination {
            Some(path) => {
                self.flatten_to(selection, path)?;
                Ok(String::new())
            }
            None => self.flattened_source(selection),
        }
    }

    /// Flattens a selection into `path`
    ///
    /// Returns false, without touching `path`, when there is nothing to flatten.
    pub fn flatten_to(&self, selection: &FileSelection, path: &Path) -> Result<bool, FlattenError> {
        let flattened = self.flattened_source(selection)?;
        if flattened.is_empty() {
            return Ok(false);
        }

        write_output(path, &flattened)?;
        info!(path = %path.display(), bytes = flattened.len(), "wrote flattened source");
        Ok(true)
    }
}

/// Writes `content` to `path` through a temp file in the same directory
///
/// The destination directory must already exist.
pub fn write_output(path: &Path, content: &str) -> Result<(), FlattenError> {
    let write_err = |source| FlattenError::DestinationWrite {
        path: path.to_path_buf(),
        source,
    };

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "flattened".to_string());
    let temp_path = path.with_file_name(format!(".{}.tmp", file_name));

    {
        let mut file = fs::File::create(&temp_path).map_err(write_err)?;
        file.write_all(content.as_bytes()).map_err(write_err)?;
        file.flush().map_err(write_err)?;
    }

    // Atomic rename
    fs::rename(&temp_path, path).map_err(|source| {
        let _ = fs::remove_file(&temp_path);
        write_err(source)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LICENSE_MARKER;
    use std::cell::Cell;
    use tempfile::TempDir;

    /// Resolver over an in-memory file list
    struct MemoryResolver {
        files: Vec<SourceFile>,
        calls: Cell<usize>,
    }

    impl MemoryResolver {
        fn new(files: Vec<SourceFile>) -> Self {
            Self {
                files,
                calls: Cell::new(0),
            }
        }
    }

    impl Resolver for MemoryResolver {
        fn resolve(&self, _selection: &FileSelection) -> Result<ResolvedSources, ResolveError> {
            self.calls.set(self.calls.get() + 1);
            Ok(ResolvedSources::new(self.files.clone()))
        }
    }

    struct FailingResolver;

    impl Resolver for FailingResolver {
        fn resolve(&self, _selection: &FileSelection) -> Result<ResolvedSources, ResolveError> {
            Err(ResolveError::FileNotFound(PathBuf::from("Gone.sol")))
        }
    }

    fn file(name: &str, deps: &[&str], content: &str) -> SourceFile {
        let mut f = SourceFile::new(SourceName::new(name).unwrap(), name, content);
        for d in deps {
            f.add_dependency(SourceName::new(d).unwrap());
        }
        f
    }

    fn abc() -> Vec<SourceFile> {
        vec![
            file(
                "C.sol",
                &["A.sol", "B.sol"],
                "// SPDX-License-Identifier: MIT\nimport \"./A.sol\";\nimport \"./B.sol\";\n\ncontract C {}\n",
            ),
            file(
                "B.sol",
                &["A.sol"],
                "// SPDX-License-Identifier: GPL-3.0\nimport \"./A.sol\";\n\ncontract B {}\n",
            ),
            file("A.sol", &[], "// SPDX-License-Identifier: MIT\ncontract A {}\n"),
        ]
    }

    #[test]
    fn flattens_in_dependency_order() {
        let flattener = Flattener::new(MemoryResolver::new(abc()));
        let out = flattener.flatten(&FileSelection::All, None).unwrap();

        let a = out.find("// File A.sol").unwrap();
        let b = out.find("// File B.sol").unwrap();
        let c = out.find("// File C.sol").unwrap();
        assert!(a < b && b < c);
        assert!(!out.contains("import "));
        assert_eq!(flattener.resolver().calls.get(), 1);
    }

    #[test]
    fn exact_artifact_format() {
        let flattener = Flattener::new(MemoryResolver::new(abc()));
        let out = flattener.flatten(&FileSelection::All, None).unwrap();

        let expected = "// SPDX-License-Identifier: MIXED\n\
                        \n\
                        // File A.sol\n\
                        // License-Identifier: MIT\n\
                        contract A {}\n\
                        \n\
                        // File B.sol\n\
                        // License-Identifier: GPL-3.0\n\
                        \n\
                        contract B {}\n\
                        \n\
                        // File C.sol\n\
                        // License-Identifier: MIT\n\
                        \n\
                        \n\
                        contract C {}";
        assert_eq!(out, expected);
    }

    #[test]
    fn single_license_header() {
        let out = Flattener::new(MemoryResolver::new(abc()))
            .flatten(&FileSelection::All, None)
            .unwrap();

        assert_eq!(out.matches(LICENSE_MARKER).count(), 1);
        assert!(out.starts_with("// SPDX-License-Identifier: MIXED\n\n"));
    }

    #[test]
    fn only_first_abi_encoder_directive_survives() {
        let directive = "pragma experimental ABIEncoderV2;";
        let body = |n: &str| format!("pragma solidity ^0.6.0;\n{}\n\ncontract {} {{}}\n", directive, n);
        let files = vec![
            file("F3.sol", &["F2.sol"], &body("F3")),
            file("F2.sol", &["F1.sol"], &body("F2")),
            file("F1.sol", &[], &body("F1")),
        ];

        let out = Flattener::new(MemoryResolver::new(files))
            .flatten(&FileSelection::All, None)
            .unwrap();

        assert_eq!(out.matches(directive).count(), 1);
        let f1 = out.find("// File F1.sol").unwrap();
        let f2 = out.find("// File F2.sol").unwrap();
        let kept = out.find(directive).unwrap();
        assert!(f1 < kept && kept < f2);
    }

    #[test]
    fn unrelated_files_appear_once_and_stably() {
        let files = vec![
            file("X.sol", &[], "contract X {}"),
            file("Y.sol", &[], "contract Y {}"),
        ];
        let flattener = Flattener::new(MemoryResolver::new(files));

        let first = flattener.flatten(&FileSelection::All, None).unwrap();
        assert_eq!(first.matches("// File X.sol").count(), 1);
        assert_eq!(first.matches("// File Y.sol").count(), 1);

        for _ in 0..3 {
            assert_eq!(flattener.flatten(&FileSelection::All, None).unwrap(), first);
        }
    }

    #[test]
    fn empty_selection_yields_empty_text_and_no_write() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("out.sol");

        let flattener = Flattener::new(MemoryResolver::new(vec![]));
        assert_eq!(flattener.flatten(&FileSelection::All, None).unwrap(), "");
        assert_eq!(flattener.flatten(&FileSelection::All, Some(&dest)).unwrap(), "");
        assert!(!dest.exists());
    }

    #[test]
    fn cycle_fails_without_writing() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("out.sol");
        let files = vec![
            file("A.sol", &["B.sol"], "contract A {}"),
            file("B.sol", &["A.sol"], "contract B {}"),
        ];

        let err = Flattener::new(MemoryResolver::new(files))
            .flatten(&FileSelection::All, Some(&dest))
            .unwrap_err();

        assert!(matches!(err, FlattenError::CyclicDependency(_)));
        assert!(!dest.exists());
    }

    #[test]
    fn unknown_dependency_is_resolution_failure() {
        let files = vec![file("A.sol", &["Missing.sol"], "contract A {}")];
        let err = Flattener::new(MemoryResolver::new(files))
            .flatten(&FileSelection::All, None)
            .unwrap_err();

        assert!(matches!(
            err,
            FlattenError::Resolution(ResolveError::MissingDependency { .. })
        ));
    }

    #[test]
    fn resolver_errors_propagate_unchanged() {
        let err = Flattener::new(FailingResolver)
            .flatten(&FileSelection::All, None)
            .unwrap_err();

        assert!(matches!(
            err,
            FlattenError::Resolution(ResolveError::FileNotFound(_))
        ));
    }

    #[test]
    fn writes_destination_and_returns_empty() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("Flat.sol");
        fs::write(&dest, "stale").unwrap();

        let flattener = Flattener::new(MemoryResolver::new(abc()));
        let returned = flattener.flatten(&FileSelection::All, Some(&dest)).unwrap();
        assert_eq!(returned, "");

        let written = fs::read_to_string(&dest).unwrap();
        let expected = flattener.flattened_source(&FileSelection::All).unwrap();
        assert_eq!(written, expected);
        assert!(!dir.path().join(".Flat.sol.tmp").exists());
    }

    #[test]
    fn flatten_to_reports_whether_written() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("Flat.sol");

        let empty = Flattener::new(MemoryResolver::new(vec![]));
        assert!(!empty.flatten_to(&FileSelection::All, &dest).unwrap());
        assert!(!dest.exists());

        let full = Flattener::new(MemoryResolver::new(abc()));
        assert!(full.flatten_to(&FileSelection::All, &dest).unwrap());
        assert!(dest.is_file());
    }

    #[test]
    fn missing_destination_directory_is_write_failure() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("missing").join("Flat.sol");

        let err = Flattener::new(MemoryResolver::new(abc()))
            .flatten(&FileSelection::All, Some(&dest))
            .unwrap_err();

        match err {
            FlattenError::DestinationWrite { path, .. } => assert_eq!(path, dest),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn dependency_order_returns_files() {
        let order = Flattener::new(MemoryResolver::new(abc()))
            .dependency_order(&FileSelection::All)
            .unwrap();

        let names: Vec<_> = order.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["A.sol", "B.sol", "C.sol"]);
    }

    #[test]
    fn custom_post_processor() {
        let processor = PostProcessor::new("UNLICENSED", vec![]);
        let out = Flattener::with_post_processor(MemoryResolver::new(abc()), processor)
            .flatten(&FileSelection::All, None)
            .unwrap();

        assert!(out.starts_with("// SPDX-License-Identifier: UNLICENSED"));
    }
}
