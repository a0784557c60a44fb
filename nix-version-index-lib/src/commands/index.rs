use super::Host;
use super::common::CommonArgs;
use crate::Result;
use crate::attrs::FlatIndex;
use crate::history::{Revision, get_repo, list_revisions};
use crate::index::{Commit, changes, load_commits, save_commits};
use camino::Utf8PathBuf;
use clap::Parser;
use ohno::{AppError, bail};
use std::io::Write;

const LOG_TARGET: &str = "   index";

#[derive(Parser, Debug)]
pub struct IndexArgs {
    /// Where the nixpkgs checkout lives (cloned if missing)
    #[arg(long, value_name = "PATH", default_value = "nixpkgs")]
    pub repo: Utf8PathBuf,

    /// Only index revisions after this one (defaults to the last revision in the commit log)
    #[arg(long, value_name = "REV")]
    pub since: Option<String>,

    /// Only index this many of the most recent revisions
    #[arg(long, value_name = "N")]
    pub max_count: Option<usize>,

    /// Commit log to write; revisions already in it are not indexed again
    #[arg(long, short = 'o', value_name = "PATH", default_value = "commits.json")]
    pub output: Utf8PathBuf,

    /// Re-evaluate revisions even if their output is already cached
    #[arg(long)]
    pub ignore_cached: bool,

    /// Do not fetch from the nixpkgs remote before listing revisions
    #[arg(long)]
    pub offline: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Index package versions across the history of the configured branch
pub async fn index_history<H: Host>(host: &mut H, args: &IndexArgs) -> Result<()> {
    let config = args.common.setup()?;
    let evaluator = config.evaluator();
    let repo = args.repo.as_std_path();

    if !args.offline {
        get_repo(repo, &config.nixpkgs_url, &config.nixpkgs_branch, config.git_timeout).await?;
    }

    let mut commits = if args.output.exists() { load_commits(&args.output)? } else { Vec::new() };

    let since = args.since.clone().or_else(|| commits.last().map(|commit| commit.rev.clone()));
    let revisions = list_revisions(repo, &config.nixpkgs_branch, since.as_deref(), args.max_count, config.git_timeout).await?;

    if revisions.is_empty() {
        let _ = writeln!(host.output(), "No new revisions to index");
        return Ok(());
    }

    // the diff baseline is the last revision already in the log, if any
    let mut previous: Option<FlatIndex> = match commits.last() {
        Some(last) => match evaluator.load(&last.rev, None, false).await {
            Ok(index) => Some(index),
            Err(e) => {
                log::warn!(target: LOG_TARGET, "Could not load baseline revision {}: {e:#}", last.rev);
                None
            }
        },
        None => None,
    };

    let mut failed: Vec<(Revision, AppError)> = Vec::new();
    let mut indexed = 0usize;

    for revision in revisions {
        if commits.iter().any(|commit| commit.rev == revision.rev) {
            log::debug!(target: LOG_TARGET, "Skipping {} which is already indexed", revision.rev);
            continue;
        }

        let current = match evaluator.load(&revision.rev, None, args.ignore_cached).await {
            Ok(index) => index,
            Err(e) => {
                log::warn!(target: LOG_TARGET, "Skipping {}: {e:#}", revision.rev);
                failed.push((revision, e));
                continue;
            }
        };

        let revision_changes = changes(previous.as_ref(), &current);
        log::info!(target: LOG_TARGET, "{} ({}): {} packages, {} changes", revision.rev, revision.date, current.len(), revision_changes.len());

        commits.push(Commit {
            rev: revision.rev,
            date: Some(revision.date),
            changes: revision_changes,
        });
        previous = Some(current);
        indexed += 1;

        // persist as we go, evaluations are too expensive to lose
        save_commits(&commits, &args.output)?;
    }

    if !failed.is_empty() {
        let _ = writeln!(host.error(), "\nUnable to index {} revision(s)", failed.len());
        for (revision, e) in &failed {
            let _ = writeln!(host.error(), "  {} ({}): {e}", revision.rev, revision.date);
        }
    }

    if indexed == 0 && !failed.is_empty() {
        host.exit(1);
        bail!("none of the {} revision(s) could be indexed", failed.len());
    }

    let _ = writeln!(host.output(), "Indexed {indexed} revision(s) into {}", args.output);
    Ok(())
}
