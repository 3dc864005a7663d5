//! Dependency inspection commands (`order`, `graph`)

use std::path::PathBuf;

use anyhow::{Context, Result};

use super::output::Output;
use crate::domain::FileSelection;
use crate::storage::Project;

/// Lists files in the order they would be flattened
pub fn order(output: &Output, project: &Project, files: Vec<PathBuf>) -> Result<()> {
    let selection = FileSelection::from_paths(files);
    let ordered = project
        .flattener()
        .dependency_order(&selection)
        .context("Failed to order sources")?;

    output.verbose_ctx("order", &format!("{} file(s)", ordered.len()));

    if output.is_json() {
        let items: Vec<_> = ordered
            .iter()
            .map(|f| {
                serde_json::json!({
                    "name": f.name,
                    "versioned_name": f.versioned_name(),
                    "path": f.path.display().to_string(),
                    "library": f.library,
                })
            })
            .collect();
        output.data(&items);
    } else {
        for file in &ordered {
            println!("{}", file.versioned_name());
        }
    }

    Ok(())
}

/// Lists each file's direct dependencies, or its direct dependents with `reverse`
pub fn graph(
    output: &Output,
    project: &Project,
    files: Vec<PathBuf>,
    reverse: bool,
) -> Result<()> {
    let selection = FileSelection::from_paths(files);
    let (sources, graph) = project
        .flattener()
        .dependency_graph(&selection)
        .context("Failed to build dependency graph")?;

    output.verbose_ctx("graph", &format!("{} node(s)", graph.len()));

    let (key, arrow) = if reverse {
        ("dependents", "<-")
    } else {
        ("dependencies", "->")
    };
    let rows: Vec<_> = graph
        .entries()
        .map(|(source, deps)| {
            let linked = if reverse {
                graph.dependents(source)
            } else {
                deps.iter().cloned().collect()
            };
            (source, linked)
        })
        .collect();

    if output.is_json() {
        let items: Vec<_> = rows
            .iter()
            .map(|(source, linked)| {
                serde_json::json!({
                    "source": source,
                    "versioned_name": sources.get(source).map(|f| f.versioned_name()),
                    key: linked,
                })
            })
            .collect();
        output.data(&items);
    } else {
        for (source, linked) in &rows {
            println!("{}", source);
            for other in linked {
                println!("  {} {}", arrow, other);
            }
        }
    }

    Ok(())
}
