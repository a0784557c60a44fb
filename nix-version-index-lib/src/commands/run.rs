//! Command dispatch logic for nix-version-index

use super::{EvalArgs, FlattenArgs, IndexArgs, InitArgs, evaluate_revision, flatten_document, index_history, init_config};
use crate::{Host, Result};
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use clap::{Parser, Subcommand};

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "nix-version-index", author, version, long_about = None)]
#[command(about = "Index nixpkgs package versions across revisions")]
#[command(styles = CLAP_STYLES)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate one nixpkgs revision and cache its package tree
    Eval(EvalArgs),
    /// Flatten a cached package tree into attribute path to version
    Flatten(FlattenArgs),
    /// Record package version changes across the nixpkgs history
    Index(Box<IndexArgs>),
    /// Generate a default configuration file
    Init(InitArgs),
}

/// Dispatch command-line arguments to the appropriate handler
///
/// This function parses the command-line arguments and executes the corresponding
/// subcommand. It's designed to be called from main.rs with the program arguments.
///
/// # Arguments
///
/// * `args` - An iterator of command-line arguments (typically from `std::env::args()`)
///
/// # Errors
///
/// Returns an error if command parsing fails or if the executed command fails
pub async fn run<I, T, H>(host: &mut H, args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
    H: Host,
{
    match &Cli::parse_from(args).command {
        Command::Eval(eval_args) => evaluate_revision(host, eval_args).await,
        Command::Flatten(flatten_args) => flatten_document(host, flatten_args),
        Command::Index(index_args) => index_history(host, index_args).await,
        Command::Init(init_args) => init_config(host, init_args),
    }
}
