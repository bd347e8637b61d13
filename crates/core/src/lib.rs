//! branchconflicts core library.
//!
//! Warns about files modified on both a remote branch (read through the
//! GitHub API) and a local branch (read from the checkout's reflogs) since
//! their estimated merge base: branch and commit resolution, merge-base
//! estimation, change-set building and conflict-set computation.

pub mod config;
pub mod conflict;
pub mod engine;
pub mod errors;
pub mod git;
pub mod models;
pub mod resolver;
pub mod source;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-exports for convenience.
pub use config::AppConfig;
pub use engine::ConflictEngine;
pub use errors::{CoreError, ErrorKind};
pub use models::{Branch, Commit, ConflictReport, ModifiedFileSet, Side};
