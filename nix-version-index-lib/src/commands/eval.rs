use super::Host;
use super::common::CommonArgs;
use crate::Result;
use clap::Parser;
use std::io::Write;

#[derive(Parser, Debug)]
pub struct EvalArgs {
    /// nixpkgs revision to evaluate
    #[arg(long, value_name = "REV")]
    pub rev: String,

    /// Hash of the unpacked revision tarball, passed to the expression as `SHA`
    #[arg(long, value_name = "HASH")]
    pub hash: Option<String>,

    /// Evaluate even if output for the revision is already cached
    #[arg(long)]
    pub ignore_cached: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Evaluate one revision and print where its output is cached
pub async fn evaluate_revision<H: Host>(host: &mut H, args: &EvalArgs) -> Result<()> {
    let config = args.common.setup()?;
    let evaluator = config.evaluator();

    match evaluator.evaluate(&args.rev, args.hash.as_deref(), args.ignore_cached).await {
        Ok(path) => {
            let _ = writeln!(host.output(), "{}", path.display());
            Ok(())
        }
        Err(e) => {
            let _ = writeln!(host.error(), "Could not evaluate revision '{}': {e}", args.rev);
            host.exit(1);
            Err(e)
        }
    }
}
