//! Dependency graph for source files
//!
//! Maps each source file to the set of files it imports, and produces a
//! topological order (dependencies before dependents).
//! Uses petgraph for the sort.

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeSet, HashMap, HashSet};
use thiserror::Error;

use super::id::SourceName;
use super::source::SourceFile;

#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("Cyclic dependency detected involving {0}")]
    CyclicDependency(SourceName),

    #[error("{source_name} depends on {dependency}, which is not in the graph")]
    UnknownSource {
        source_name: SourceName,
        dependency: SourceName,
    },
}

/// A dependency graph for source files
///
/// Nodes keep the order in which they were added, which is the resolution
/// order when built with [`DependencyGraph::from_sources`].
#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    /// Source names in insertion order
    nodes: Vec<SourceName>,

    /// Direct dependencies of each node
    edges: HashMap<SourceName, BTreeSet<SourceName>>,
}

impl DependencyGraph {
    /// Creates an empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from resolved files
    ///
    /// Every file becomes a node, including files without dependencies.
    /// A dependency that is not one of `files` is an error.
    pub fn from_sources<'a>(
        files: impl IntoIterator<Item = &'a SourceFile>,
    ) -> Result<Self, GraphError> {
        let mut graph = Self::new();

        // First pass: add all nodes
        let files: Vec<_> = files.into_iter().collect();
        for file in &files {
            graph.add_source(file.name.clone());
        }

        // Second pass: add all edges
        for file in &files {
            for dependency in &file.dependencies {
                graph.add_dependency(&file.name, dependency)?;
            }
        }

        Ok(graph)
    }

    /// Adds a source to the graph
    pub fn add_source(&mut self, name: SourceName) {
        if !self.edges.contains_key(&name) {
            self.edges.insert(name.clone(), BTreeSet::new());
            self.nodes.push(name);
        }
    }

    /// Adds a dependency edge: `source` imports `dependency`
    ///
    /// `source` is added as a node if missing; `dependency` must already exist.
    pub fn add_dependency(
        &mut self,
        source: &SourceName,
        dependency: &SourceName,
    ) -> Result<(), GraphError> {
        if !self.edges.contains_key(dependency) {
            return Err(GraphError::UnknownSource {
                source_name: source.clone(),
                dependency: dependency.clone(),
            });
        }

        self.add_source(source.clone());
        if let Some(deps) = self.edges.get_mut(source) {
            deps.insert(dependency.clone());
        }
        Ok(())
    }

    /// Returns the direct dependencies of a source
    pub fn dependencies(&self, name: &SourceName) -> Vec<SourceName> {
        self.edges
            .get(name)
            .map(|deps| deps.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns the direct dependents of a source (files that import it)
    pub fn dependents(&self, name: &SourceName) -> Vec<SourceName> {
        self.entries()
            .filter(|(_, deps)| deps.contains(name))
            .map(|(source, _)| source.clone())
            .collect()
    }

    /// Iterates `(dependent, dependencies)` pairs in insertion order
    pub fn entries(&self) -> impl Iterator<Item = (&SourceName, &BTreeSet<SourceName>)> {
        self.nodes.iter().filter_map(|name| self.edges.get_key_value(name))
    }

    /// Orders sources using only the edge relation
    ///
    /// Nodes that take part in no edge do not appear in the result.
    pub fn edge_order(&self) -> Result<Vec<SourceName>, GraphError> {
        let mut graph: DiGraph<SourceName, ()> = DiGraph::new();
        let mut indices: HashMap<SourceName, NodeIndex> = HashMap::new();

        let mut node = |graph: &mut DiGraph<SourceName, ()>, name: &SourceName| -> NodeIndex {
            *indices
                .entry(name.clone())
                .or_insert_with(|| graph.add_node(name.clone()))
        };

        for (source, deps) in self.entries() {
            for dependency in deps {
                // Edge direction: dependency -> source
                let from = node(&mut graph, dependency);
                let to = node(&mut graph, source);
                graph.add_edge(from, to, ());
            }
        }

        match toposort(&graph, None) {
            Ok(order) => Ok(order
                .into_iter()
                .filter_map(|idx| graph.node_weight(idx).cloned())
                .collect()),
            Err(cycle) => Err(GraphError::CyclicDependency(graph[cycle.node_id()].clone())),
        }
    }

    /// Returns all sources in topological order (dependencies before dependents)
    ///
    /// Sources with no edges follow the edge-derived order, in insertion order.
    pub fn topological_order(&self) -> Result<Vec<SourceName>, GraphError> {
        let sorted = self.edge_order()?;
        Ok(append_and_dedupe(sorted, self.nodes.iter().cloned()))
    }

    /// Returns true if the graph contains the source
    pub fn contains(&self, name: &SourceName) -> bool {
        self.edges.contains_key(name)
    }

    /// Returns the number of sources in the graph
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the graph is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Appends `all` to `sorted` and keeps only the first occurrence of each name
///
/// Names already present in `sorted` keep their position; the rest are
/// appended in the order `all` yields them.
pub fn append_and_dedupe(
    sorted: Vec<SourceName>,
    all: impl IntoIterator<Item = SourceName>,
) -> Vec<SourceName> {
    let mut seen = HashSet::new();
    sorted
        .into_iter()
        .chain(all)
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn name(s: &str) -> SourceName {
        SourceName::new(s).unwrap()
    }

    fn file(n: &str, deps: &[&str]) -> SourceFile {
        let mut f = SourceFile::new(name(n), n, "");
        for d in deps {
            f.add_dependency(name(d));
        }
        f
    }

    fn position(order: &[SourceName], n: &str) -> usize {
        order.iter().position(|x| x.as_str() == n).unwrap()
    }

    #[test]
    fn empty_graph() {
        let graph = DependencyGraph::new();
        assert!(graph.is_empty());
        assert_eq!(graph.len(), 0);
        assert!(graph.topological_order().unwrap().is_empty());
    }

    #[test]
    fn from_sources_includes_isolated_files() {
        let files = [file("A.sol", &[]), file("B.sol", &["A.sol"]), file("X.sol", &[])];
        let graph = DependencyGraph::from_sources(&files).unwrap();

        assert_eq!(graph.len(), 3);
        assert!(graph.contains(&name("X.sol")));
        assert_eq!(graph.dependencies(&name("B.sol")), vec![name("A.sol")]);
        assert_eq!(graph.dependents(&name("A.sol")), vec![name("B.sol")]);
    }

    #[test]
    fn entries_follow_insertion_order() {
        let files = [file("C.sol", &["A.sol"]), file("A.sol", &[]), file("B.sol", &[])];
        let graph = DependencyGraph::from_sources(&files).unwrap();

        let names: Vec<_> = graph.entries().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["C.sol", "A.sol", "B.sol"]);
    }

    #[test]
    fn unknown_dependency_is_error() {
        let files = [file("A.sol", &["Missing.sol"])];
        let result = DependencyGraph::from_sources(&files);

        assert_eq!(
            result.unwrap_err(),
            GraphError::UnknownSource {
                source_name: name("A.sol"),
                dependency: name("Missing.sol"),
            }
        );
    }

    #[test]
    fn chain_order() {
        let files = [
            file("C.sol", &["A.sol", "B.sol"]),
            file("B.sol", &["A.sol"]),
            file("A.sol", &[]),
        ];
        let graph = DependencyGraph::from_sources(&files).unwrap();

        let order = graph.topological_order().unwrap();
        let names: Vec<_> = order.iter().map(|n| n.as_str()).collect();
        assert_eq!(names, vec!["A.sol", "B.sol", "C.sol"]);
    }

    #[test]
    fn edge_order_skips_isolated_nodes() {
        let files = [file("A.sol", &[]), file("B.sol", &["A.sol"]), file("X.sol", &[])];
        let graph = DependencyGraph::from_sources(&files).unwrap();

        let edge_only = graph.edge_order().unwrap();
        assert_eq!(edge_only.len(), 2);
        assert!(!edge_only.contains(&name("X.sol")));

        let full = graph.topological_order().unwrap();
        assert_eq!(full.len(), 3);
        assert_eq!(full.last().unwrap(), &name("X.sol"));
    }

    #[test]
    fn cycle_detection() {
        let files = [file("A.sol", &["B.sol"]), file("B.sol", &["A.sol"])];
        let graph = DependencyGraph::from_sources(&files).unwrap();

        match graph.topological_order() {
            Err(GraphError::CyclicDependency(n)) => {
                assert!(n == name("A.sol") || n == name("B.sol"));
            }
            other => panic!("expected cycle error, got {:?}", other),
        }
    }

    #[test]
    fn self_import_is_a_cycle() {
        let files = [file("A.sol", &["A.sol"])];
        let graph = DependencyGraph::from_sources(&files).unwrap();

        assert_eq!(
            graph.topological_order(),
            Err(GraphError::CyclicDependency(name("A.sol")))
        );
    }

    #[test]
    fn unrelated_files_are_stable() {
        let files = [file("X.sol", &[]), file("Y.sol", &[])];
        let graph = DependencyGraph::from_sources(&files).unwrap();

        let first = graph.topological_order().unwrap();
        for _ in 0..5 {
            assert_eq!(graph.topological_order().unwrap(), first);
        }
        assert_eq!(first, vec![name("X.sol"), name("Y.sol")]);
    }

    #[test]
    fn append_and_dedupe_keeps_first_occurrence() {
        let sorted = vec![name("A.sol"), name("B.sol")];
        let all = vec![name("B.sol"), name("X.sol"), name("A.sol"), name("Y.sol")];

        let result = append_and_dedupe(sorted, all);
        let names: Vec<_> = result.iter().map(|n| n.as_str()).collect();
        assert_eq!(names, vec!["A.sol", "B.sol", "X.sol", "Y.sol"]);
    }

    #[test]
    fn append_and_dedupe_with_empty_sort() {
        let all = vec![name("X.sol"), name("Y.sol"), name("X.sol")];
        let result = append_and_dedupe(vec![], all);
        assert_eq!(result, vec![name("X.sol"), name("Y.sol")]);
    }

    #[test]
    fn performance_500_files() {
        use std::time::Instant;

        let files: Vec<_> = (0..500)
            .map(|i| {
                let n = format!("F{}.sol", i);
                if i == 0 {
                    file(&n, &[])
                } else {
                    let prev = format!("F{}.sol", i - 1);
                    file(&n, &[prev.as_str()])
                }
            })
            .collect();

        let graph = DependencyGraph::from_sources(&files).unwrap();

        let start = Instant::now();
        let order = graph.topological_order().unwrap();
        let duration = start.elapsed();

        assert_eq!(order.len(), 500);
        assert!(duration.as_millis() < 100, "Sort took {:?}", duration);
    }

    /// Random DAG: file `i` may only depend on files with a smaller index
    fn dag_strategy() -> impl Strategy<Value = Vec<SourceFile>> {
        (1usize..25).prop_flat_map(|n| {
            proptest::collection::vec(proptest::collection::vec(any::<prop::sample::Index>(), 0..4), n)
                .prop_map(move |picks| {
                    picks
                        .into_iter()
                        .enumerate()
                        .map(|(i, deps)| {
                            let mut f = SourceFile::new(name(&format!("F{}.sol", i)), "", "");
                            if i > 0 {
                                for d in deps {
                                    f.add_dependency(name(&format!("F{}.sol", d.index(i))));
                                }
                            }
                            f
                        })
                        .rev()
                        .collect()
                })
        })
    }

    proptest! {
        #[test]
        fn order_is_complete_and_respects_edges(files in dag_strategy()) {
            let graph = DependencyGraph::from_sources(&files).unwrap();
            let order = graph.topological_order().unwrap();

            prop_assert_eq!(order.len(), files.len());
            let unique: HashSet<_> = order.iter().collect();
            prop_assert_eq!(unique.len(), files.len());

            for f in &files {
                for dep in &f.dependencies {
                    prop_assert!(position(&order, dep.as_str()) < position(&order, f.name.as_str()));
                }
            }
        }

        #[test]
        fn order_is_deterministic(files in dag_strategy()) {
            let first = DependencyGraph::from_sources(&files).unwrap().topological_order().unwrap();
            let second = DependencyGraph::from_sources(&files).unwrap().topological_order().unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
