//! solflat - Flatten interdependent Solidity sources into one file
//!
//! Builds a dependency graph from a source tree, orders it so every
//! dependency comes before the files that import it, strips import
//! statements, and concatenates the result into a single artifact suitable
//! for verification.

pub mod domain;
pub mod storage;
pub mod flatten;
pub mod cli;

pub use domain::{DependencyGraph, FileSelection, Resolver, SourceFile, SourceName};
pub use flatten::{FlattenError, Flattener};
pub use storage::{FsResolver, Project};
