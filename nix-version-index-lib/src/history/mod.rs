//! Managing the nixpkgs checkout and listing its revisions
//!
//! The checkout is a partial clone (`--filter=blob:none`) without a work tree: only commit
//! metadata is ever read locally, the evaluator fetches each revision's sources itself.
//! Revisions are listed along the first-parent chain of the tracked branch, oldest first.

mod git;
mod revision;

pub use git::{get_repo, list_revisions};
pub use revision::Revision;
