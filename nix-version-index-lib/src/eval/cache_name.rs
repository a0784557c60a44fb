//! File names for cached evaluator output.

/// Build the cache file name for a revision and optional tarball hash.
#[must_use]
pub fn cache_file_name(rev: &str, hash: Option<&str>) -> String {
    match hash {
        Some(hash) if !hash.is_empty() => format!("{}-{}.json", sanitize_path_component(rev), sanitize_path_component(hash)),
        _ => format!("{}.json", sanitize_path_component(rev)),
    }
}

/// Sanitize a string for use as a path component
///
/// Revisions may be given as ref names (`release-23.11`, `origin/master`), so traversal
/// sequences and characters that are special to filesystems are replaced.
#[must_use]
fn sanitize_path_component(s: &str) -> String {
    let s = s.replace("..", "__");
    s.replace(['/', '\\', ':', '*', '?', '"', '<', '>', '|'], "_")
}
