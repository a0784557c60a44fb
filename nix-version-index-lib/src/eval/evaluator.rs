use super::cache_name::cache_file_name;
use crate::Result;
use crate::attrs::{FlatIndex, decode_namespace, flatten};
use core::time::Duration;
use ohno::{IntoAppError, bail};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use tokio::process::Command;

const LOG_TARGET: &str = "    eval";

/// Runs `nix eval` for individual revisions and caches the output.
#[derive(Debug, Clone)]
pub struct Evaluator {
    program: OsString,
    expression: PathBuf,
    packages_dir: PathBuf,
    timeout: Duration,
}

impl Evaluator {
    /// Create an evaluator.
    ///
    /// `program` is the `nix` executable, `expression` the file passed to `nix eval --file`,
    /// and `packages_dir` the directory holding cached output.
    #[must_use]
    pub fn new(program: impl Into<OsString>, expression: impl Into<PathBuf>, packages_dir: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            expression: expression.into(),
            packages_dir: packages_dir.into(),
            timeout,
        }
    }

    /// Where the output for a revision is cached.
    #[must_use]
    pub fn cache_path(&self, rev: &str, hash: Option<&str>) -> PathBuf {
        self.packages_dir.join(cache_file_name(rev, hash))
    }

    /// Make sure the evaluator output for a revision is cached, returning its path.
    ///
    /// # Errors
    ///
    /// Returns an error if `nix eval` cannot be run, fails, times out, or its output cannot be
    /// written to the cache.
    pub async fn evaluate(&self, rev: &str, hash: Option<&str>, ignore_cached: bool) -> Result<PathBuf> {
        let path = self.cache_path(rev, hash);

        if !ignore_cached && path.exists() {
            log::debug!(target: LOG_TARGET, "Cache hit for {rev} at '{}'", path.display());
            return Ok(path);
        }

        log::info!(target: LOG_TARGET, "No cached evaluation at '{}', evaluating {rev}", path.display());
        let start_time = std::time::Instant::now();

        let output = self.run_nix(rev, hash).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            log::error!(target: LOG_TARGET, "{}", stderr.trim());
            bail!("evaluating {rev} failed ({}): {}", output.status, last_line(&stderr));
        }

        fs::create_dir_all(&self.packages_dir)
            .into_app_err_with(|| format!("unable to create directory '{}'", self.packages_dir.display()))?;
        fs::write(&path, &output.stdout).into_app_err_with(|| format!("unable to write evaluation cache '{}'", path.display()))?;

        log::debug!(target: LOG_TARGET, "Evaluated {rev} in {:.3}s ({} bytes)", start_time.elapsed().as_secs_f64(), output.stdout.len());
        Ok(path)
    }

    /// Evaluate a revision and flatten its package tree.
    ///
    /// Decoding runs on the blocking thread pool since documents span the whole of nixpkgs.
    ///
    /// # Errors
    ///
    /// Returns an error if evaluation fails or the cached document is not a well-formed
    /// package tree.
    pub async fn load(&self, rev: &str, hash: Option<&str>, ignore_cached: bool) -> Result<FlatIndex> {
        let path = self.evaluate(rev, hash, ignore_cached).await?;

        tokio::task::spawn_blocking(move || read_index(&path))
            .await
            .into_app_err("package tree decoding task failed")?
    }

    async fn run_nix(&self, rev: &str, hash: Option<&str>) -> Result<Output> {
        let mut command = Command::new(&self.program);
        let _ = command
            .arg("eval")
            .arg("--file")
            .arg(&self.expression)
            .args(["--raw", "--show-trace"])
            .env("COMMIT", rev)
            .env("SHA", hash.unwrap_or_default())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let program = self.program.to_string_lossy();
        let child = command.spawn().into_app_err_with(|| format!("could not spawn '{program}'"))?;

        match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(e).into_app_err_with(|| format!("'{program} eval' failed to run")),
            Err(_) => {
                bail!("'{program} eval' for {rev} timed out after {} seconds", self.timeout.as_secs());
            }
        }
    }
}

/// Read a cached evaluator document and flatten it.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a well-formed package tree.
pub fn read_index(path: &Path) -> Result<FlatIndex> {
    let bytes = fs::read(path).into_app_err_with(|| format!("unable to read '{}'", path.display()))?;
    let namespace = decode_namespace(&bytes).into_app_err_with(|| format!("unable to decode package tree '{}'", path.display()))?;

    let index = flatten(&namespace);
    log::debug!(target: LOG_TARGET, "Flattened {} packages from '{}'", index.len(), path.display());
    Ok(index)
}

fn last_line(stderr: &str) -> &str {
    stderr.lines().rev().find(|line| !line.trim().is_empty()).map_or("", str::trim)
}
