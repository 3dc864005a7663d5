//! Domain models for solflat
//!
//! Source identities, the dependency graph, and the text transformations
//! applied while flattening. Nothing here touches the filesystem.

mod id;
mod source;
mod graph;
mod imports;
mod postprocess;

pub use id::{SourceName, SourceNameError};
pub use source::{FileSelection, LibraryInfo, ResolveError, ResolvedSources, Resolver, SourceFile};
pub use graph::{append_and_dedupe, DependencyGraph, GraphError};
pub use imports::{import_paths, strip_imports};
pub use postprocess::{
    assemble, demote_license_markers, keep_first_directive, PostProcessor, ABI_ENCODER_V2,
    DEFAULT_LICENSE, DEMOTED_LICENSE_MARKER, LICENSE_MARKER,
};
