//! Per-revision change records
//!
//! Each nixpkgs revision is reduced to a [`FlatIndex`](crate::attrs::FlatIndex) of attribute
//! path to version. Comparing the index of a revision with the one before it yields the list
//! of [`Change`]s introduced by that revision, which is recorded in a [`Commit`].
//!
//! A sequence of commits forms the version history of every package and is persisted as a
//! single JSON document through the [`doc`] helpers.

mod change;
mod commit;
pub mod doc;

pub use change::{Change, changes};
pub use commit::{Commit, load_commits, save_commits};
