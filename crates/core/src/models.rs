//! Domain model types used throughout branchconflicts.
//!
//! These types are produced by the resolvers, consumed by the merge-base
//! estimator and conflict detector, and serialized by the CLI.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

// ---------------------------------------------------------------------------
// Side
// ---------------------------------------------------------------------------

/// Which data source a branch, commit or change set comes from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// The hosting API (GitHub).
    Remote,
    /// The on-disk repository's reflogs and object store.
    Local,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote => write!(f, "remote"),
            Self::Local => write!(f, "local"),
        }
    }
}

// ---------------------------------------------------------------------------
// Branch / Commit
// ---------------------------------------------------------------------------

/// A branch name and the commit it currently points to.
///
/// Names are unique within one [`Side`] only; `main` on the remote and `main`
/// locally are two different branches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Branch {
    pub name: String,
    pub tip_commit_id: String,
}

impl Branch {
    pub fn new(name: impl Into<String>, tip_commit_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tip_commit_id: tip_commit_id.into(),
        }
    }
}

/// Commit metadata as resolved from one side.
///
/// For local commits `parent_ids` is accumulated from reflog entries and is
/// an approximation of ancestry, not the commit's real parent list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Commit {
    pub id: String,
    pub message: String,
    pub parent_ids: Vec<String>,
}

impl Commit {
    /// Build a commit, dropping any parent entry equal to `id`.
    pub fn new(id: impl Into<String>, message: impl Into<String>, parent_ids: Vec<String>) -> Self {
        let id = id.into();
        let before = parent_ids.len();
        let parent_ids: Vec<String> = parent_ids.into_iter().filter(|p| *p != id).collect();
        if parent_ids.len() != before {
            debug!(id = %id, dropped = before - parent_ids.len(), "dropped self-referencing parent ids");
        }
        Self {
            id,
            message: message.into(),
            parent_ids,
        }
    }
}

// ---------------------------------------------------------------------------
// Change sets
// ---------------------------------------------------------------------------

/// Deduplicated set of paths touched between an ancestor and an endpoint.
pub type ModifiedFileSet = BTreeSet<String>;

/// Full outcome of a conflict check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictReport {
    pub remote_branch: Branch,
    pub local_branch: Branch,
    /// Estimated common ancestor; `None` when the two histories share no id.
    pub merge_base: Option<String>,
    pub remote_changes: ModifiedFileSet,
    pub local_changes: ModifiedFileSet,
    /// Paths modified on both sides since the merge base.
    pub conflicts: ModifiedFileSet,
}

impl ConflictReport {
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }
}
