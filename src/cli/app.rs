//! Main CLI application structure

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use super::output::{Output, OutputFormat};
use super::{flatten_cmd, graph_cmd};
use crate::storage::{Config, Project};

#[derive(Parser)]
#[command(name = "solflat")]
#[command(author, version, about = "Flatten Solidity sources into a single dependency-ordered file")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the global config, then text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Project root (defaults to the nearest directory containing solflat.toml)
    #[arg(long, global = true, env = "SOLFLAT_ROOT")]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create solflat.toml and the sources directory
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Flatten source files into a single file
    Flatten {
        /// Files to flatten with their dependencies (defaults to every source file)
        files: Vec<PathBuf>,

        /// Write the result to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// List files in the order they are flattened
    Order {
        /// Entry files (defaults to every source file)
        files: Vec<PathBuf>,
    },

    /// Show each file's direct dependencies
    Graph {
        /// Entry files (defaults to every source file)
        files: Vec<PathBuf>,

        /// Show the files that import each file instead
        #[arg(long, short)]
        reverse: bool,
    },
}

/// Installs the tracing subscriber; `RUST_LOG` overrides the verbosity flag
fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "solflat=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .try_init();
}

/// Opens the project named by `--root`, or the one around the current directory
fn open_project(root: Option<PathBuf>, output: &Output) -> Result<Project> {
    let project = match root {
        Some(root) => Project::open(root)?,
        None => Project::open_current()?,
    };
    output.verbose_ctx("project", &format!("Project root: {}", project.root().display()));
    output.verbose_ctx(
        "project",
        &format!(
            "Sources: {}, libraries: {}",
            project.config().project.paths.sources.display(),
            project.config().project.paths.libraries.display()
        ),
    );
    Ok(project)
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let format = match cli.format {
        Some(format) => format,
        None => Config::load_global()?.default_format.into(),
    };
    let output = Output::new(format, cli.verbose);

    output.verbose("solflat starting");

    match cli.command {
        Commands::Init { path } => {
            output.verbose_ctx("init", &format!("Initializing project at: {}", path.display()));
            let project = Project::init(&path)?;
            output.verbose_ctx(
                "init",
                &format!("Config at: {}", project.config_path().display()),
            );
            output.success(&format!(
                "Initialized solflat project at {}",
                project.root().display()
            ));
        }

        Commands::Flatten { files, output: output_path } => {
            let project = open_project(cli.root, &output)?;
            flatten_cmd::run(&output, &project, files, output_path.as_deref())?
        }

        Commands::Order { files } => {
            let project = open_project(cli.root, &output)?;
            graph_cmd::order(&output, &project, files)?
        }

        Commands::Graph { files, reverse } => {
            let project = open_project(cli.root, &output)?;
            graph_cmd::graph(&output, &project, files, reverse)?
        }
    }

    output.verbose("Command completed successfully");
    Ok(())
}
