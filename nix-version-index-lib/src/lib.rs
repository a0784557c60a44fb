#![doc(hidden)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core library for nix-version-index
//!
//! This library consolidates all functionality for the nix-version-index tool, which records
//! the version of every nixpkgs package across the repository's history.
//!
//! # Module Organization
//!
//! - [`attrs`]: Decoding and flattening of the evaluator's package tree
//! - [`index`]: Per-revision change records and their persistence
//! - [`eval`]: Running the evaluator and caching its output
//! - [`history`]: Managing the nixpkgs checkout and listing revisions
//! - [`commands`]: Command-line interface and orchestration

pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

pub mod attrs;

#[cfg(any(debug_assertions, test))]
pub mod commands;
#[cfg(not(any(debug_assertions, test)))]
mod commands;

pub mod eval;
pub mod history;
pub mod index;

pub use crate::commands::{Host, run};
