//! Running the package-expression evaluator
//!
//! For every nixpkgs revision the tool runs `nix eval` against a small expression file that
//! imports that revision and dumps its package tree as JSON. Evaluations are slow, so the raw
//! output is cached on disk under `{rev}-{hash}.json` and reused on later runs.
//!
//! The expression file receives the revision through the `COMMIT` environment variable and
//! the unpacked tarball hash, when known, through `SHA`.

mod cache_name;
mod evaluator;

pub use evaluator::{Evaluator, read_index};
