//! Conflict detection logic.
//!
//! Given the paths changed on the local and remote sides since the merge
//! base, the detector returns the paths touched on both sides. This is a
//! path-level early warning, not a content merge.

use tracing::{debug, info};

use crate::models::ModifiedFileSet;

/// Stateless conflict detector over two change sets.
pub struct ConflictDetector;

impl ConflictDetector {
    /// Paths present in both `local` and `remote`.
    pub fn detect(local: &ModifiedFileSet, remote: &ModifiedFileSet) -> ModifiedFileSet {
        info!(
            local_count = local.len(),
            remote_count = remote.len(),
            "detecting conflicts"
        );

        let conflicts: ModifiedFileSet = local.intersection(remote).cloned().collect();

        for path in &conflicts {
            debug!(path = %path, "conflict detected");
        }
        info!(count = conflicts.len(), "conflict detection complete");
        conflicts
    }
}
