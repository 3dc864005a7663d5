//! Flatten command

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::output::Output;
use crate::domain::FileSelection;
use crate::storage::Project;

/// Flattens the selected files, printing the result or writing it to `output_path`
pub fn run(
    output: &Output,
    project: &Project,
    files: Vec<PathBuf>,
    output_path: Option<&Path>,
) -> Result<()> {
    let selection = FileSelection::from_paths(files);
    output.verbose_ctx("flatten", &format!("Selection: {:?}", selection));

    let flattener = project.flattener();

    match output_path {
        Some(path) => {
            let written = flattener
                .flatten_to(&selection, path)
                .context("Failed to flatten sources")?;

            if output.is_json() {
                output.data(&serde_json::json!({
                    "written": written,
                    "output": path.display().to_string(),
                }));
            } else if written {
                output.success(&format!("Flattened source written to {}", path.display()));
            } else {
                output.success("No source files to flatten");
            }
        }
        None => {
            let flattened = flattener
                .flatten(&selection, None)
                .context("Failed to flatten sources")?;
            output.verbose_ctx("flatten", &format!("Flattened {} bytes", flattened.len()));

            if output.is_json() {
                output.data(&serde_json::json!({ "source": flattened }));
            } else if !flattened.is_empty() {
                println!("{}", flattened);
            }
        }
    }

    Ok(())
}
