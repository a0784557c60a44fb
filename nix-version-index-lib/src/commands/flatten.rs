use super::Host;
use super::common::{CommonArgs, init_logging};
use crate::Result;
use crate::eval::read_index;
use crate::index::doc;
use camino::Utf8PathBuf;
use clap::Parser;
use ohno::IntoAppError;
use std::io::Write;

#[derive(Parser, Debug)]
pub struct FlattenArgs {
    /// Cached `nix eval` output to flatten
    #[arg(value_name = "INPUT")]
    pub input: Utf8PathBuf,

    /// Write the flattened index to this file instead of standard output
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: Option<Utf8PathBuf>,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Flatten an evaluator document into a JSON map of attribute path to version
pub fn flatten_document<H: Host>(host: &mut H, args: &FlattenArgs) -> Result<()> {
    init_logging(args.common.log_level);

    let index = match read_index(args.input.as_std_path()) {
        Ok(index) => index,
        Err(e) => {
            let _ = writeln!(host.error(), "Could not flatten '{}': {e}", args.input);
            host.exit(1);
            return Err(e);
        }
    };

    if let Some(output) = &args.output {
        doc::save(&index, output)?;
        let _ = writeln!(host.output(), "Wrote {} packages to {output}", index.len());
    } else {
        doc::write(&index, host.output()).into_app_err("writing flattened index")?;
    }

    Ok(())
}
