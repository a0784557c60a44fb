use super::revision::{Revision, parse_log};
use crate::Result;
use core::time::Duration;
use ohno::{IntoAppError, bail};
use std::fs;
use std::path::Path;
use tokio::process::Command;
use url::Url;

const LOG_TARGET: &str = " history";

/// Clone or update the nixpkgs checkout
pub async fn get_repo(repo_path: &Path, repo_url: &Url, branch: &str, timeout: Duration) -> Result<()> {
    let start_time = std::time::Instant::now();

    get_repo_core(repo_path, repo_url, branch, timeout).await?;

    log::debug!(target: LOG_TARGET, "Prepared repository '{}' from '{repo_url}' in {:.3}s", repo_path.display(), start_time.elapsed().as_secs_f64());
    Ok(())
}

async fn get_repo_core(repo_path: &Path, repo_url: &Url, branch: &str, timeout: Duration) -> Result<()> {
    let path_str = repo_path.to_str().into_app_err("invalid UTF-8 in repository path")?;

    if !repo_path.exists() {
        if let Some(parent) = repo_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).into_app_err_with(|| format!("could not create directory '{}'", parent.display()))?;
        }

        return clone_repo(path_str, repo_url, branch, timeout).await;
    }

    if !repo_path.join(".git").exists() {
        log::warn!(target: LOG_TARGET, "Repository path '{path_str}' exists but .git directory missing, re-cloning");
        fs::remove_dir_all(repo_path).into_app_err_with(|| format!("could not remove '{path_str}' before re-cloning"))?;
        return clone_repo(path_str, repo_url, branch, timeout).await;
    }

    log::info!(target: LOG_TARGET, "Fetching '{branch}' from '{repo_url}'");

    let refspec = format!("+refs/heads/{branch}:refs/remotes/origin/{branch}");
    let output = run_git_with_timeout(&["-C", path_str, "fetch", "origin", "--filter=blob:none", "--no-tags", &refspec], timeout).await?;
    check_git_output(&output, "git fetch")
}

async fn clone_repo(repo_path: &str, repo_url: &Url, branch: &str, timeout: Duration) -> Result<()> {
    log::info!(target: LOG_TARGET, "Cloning '{repo_url}' into '{repo_path}'");
    let output = run_git_with_timeout(
        &[
            "clone",
            "--filter=blob:none",
            "--no-checkout",
            "--single-branch",
            "--no-tags",
            "--branch",
            branch,
            repo_url.as_str(),
            repo_path,
        ],
        timeout,
    )
    .await?;
    check_git_output(&output, "git clone")
}

/// List the first-parent history of the tracked branch, oldest first.
///
/// With `since`, only revisions after it are listed. With `max_count`, only the most recent
/// `max_count` revisions are kept.
pub async fn list_revisions(repo_path: &Path, branch: &str, since: Option<&str>, max_count: Option<usize>, timeout: Duration) -> Result<Vec<Revision>> {
    let path_str = repo_path.to_str().into_app_err("invalid UTF-8 in repository path")?;

    let range = since.map_or_else(|| format!("origin/{branch}"), |since| format!("{since}..origin/{branch}"));
    let max_count = max_count.map(|n| format!("--max-count={n}"));

    let mut args = vec!["-C", path_str, "log", "--first-parent", "--reverse", "--format=%H%x09%cI"];
    if let Some(max_count) = &max_count {
        args.push(max_count);
    }
    args.push(&range);
    args.push("--");

    let output = run_git_with_timeout(&args, timeout).await?;
    check_git_output(&output, "git log")?;

    let revisions = parse_log(&String::from_utf8_lossy(&output.stdout))?;
    log::debug!(target: LOG_TARGET, "Found {} revisions in {range}", revisions.len());
    Ok(revisions)
}

fn check_git_output(output: &std::process::Output, operation: &str) -> Result<()> {
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("{operation} failed: {}", stderr.trim());
    }
    Ok(())
}

async fn run_git_with_timeout(args: &[&str], timeout: Duration) -> Result<std::process::Output> {
    let child = Command::new("git")
        .args(args)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .into_app_err("could not spawn git command")?;

    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(e).into_app_err_with(|| format!("'git {}' failed to run", args.join(" "))),
        Err(_) => {
            bail!("'git {}' timed out after {} seconds", args.join(" "), timeout.as_secs());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::{ExitStatus, Output};

    fn status(code: i32) -> ExitStatus {
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            ExitStatus::from_raw(code << 8)
        }

        #[cfg(windows)]
        {
            use std::os::windows::process::ExitStatusExt;
            ExitStatus::from_raw(code.cast_unsigned())
        }
    }

    #[test]
    fn test_check_git_output_success() {
        let output = Output {
            status: status(0),
            stdout: vec![],
            stderr: vec![],
        };

        check_git_output(&output, "git log").unwrap();
    }

    #[test]
    fn test_check_git_output_failure_includes_stderr() {
        let output = Output {
            status: status(128),
            stdout: vec![],
            stderr: b"fatal: not a git repository\n".to_vec(),
        };

        let error_msg = check_git_output(&output, "git fetch").unwrap_err().to_string();
        assert!(error_msg.contains("git fetch failed"));
        assert!(error_msg.contains("not a git repository"));
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot spawn processes")]
    async fn test_list_revisions_outside_repository_fails() {
        let temp_dir = tempfile::tempdir().unwrap();
        let result = list_revisions(temp_dir.path(), "master", None, None, Duration::from_secs(30)).await;
        assert!(result.is_err());
    }
}
