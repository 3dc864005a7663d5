//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Commands
//!
//! | Command | Purpose |
//! |---------|---------|
//! | `init` | Write `solflat.toml` and create the sources directory |
//! | `flatten [FILES]... [-o PATH]` | Print or write the flattened source |
//! | `order [FILES]...` | List files in flatten order |
//! | `graph [FILES]... [--reverse]` | List each file's direct dependencies (or dependents) |
//!
//! Without `FILES`, every source file under the configured sources
//! directory is used.
//!
//! ## Output Formats
//!
//! All commands support `--format`:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Verbose Mode
//!
//! `--verbose` (or `-v`) prints debug lines and enables `debug` tracing
//! events; `RUST_LOG` takes precedence when set:
//! ```bash
//! solflat --verbose flatten contracts/Token.sol
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod output;
mod flatten_cmd;
mod graph_cmd;

pub use app::{Cli, Commands, run};
pub use output::{Output, OutputFormat};
