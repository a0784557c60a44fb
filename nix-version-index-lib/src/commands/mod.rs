//! Command-line interface and orchestration for nix-version-index
//!
//! This module implements the CLI commands and ties the evaluator, the package-tree decoder,
//! and the commit log together. It handles argument parsing, configuration management, and
//! the high-level workflows.
//!
//! ## Commands
//!
//! - **eval**: Evaluate one nixpkgs revision and print the path of its cached output
//! - **flatten**: Turn a cached evaluator document into a map of attribute path to version
//! - **index**: Walk the nixpkgs history and record which package versions changed at
//!   each revision
//! - **init**: Generate a default configuration file
//!
//! ## Execution Flow
//!
//! The `run` function parses command-line arguments using clap and routes to the
//! appropriate command handler. Handlers that need external tools first set up logging
//! and load the TOML configuration through [`common::CommonArgs`].

mod common;
mod config;
mod eval;
mod flatten;
mod host;
mod index;
mod init;
mod run;

#[cfg(debug_assertions)]
pub use config::Config;

pub use eval::{EvalArgs, evaluate_revision};
pub use flatten::{FlattenArgs, flatten_document};
pub use host::Host;
#[cfg(test)]
pub use host::TestHost;
pub use index::{IndexArgs, index_history};
pub use init::{InitArgs, init_config};
pub use run::run;
