//! Merge-base estimation and conflict-set computation.
//!
//! The conflict subsystem is responsible for:
//! 1. **Merge base** -- picking an approximate common ancestor of the remote
//!    and local tips from their parent id lists.
//! 2. **Detection** -- intersecting the remote and local change sets.

pub mod detector;
pub mod merge_base;

pub use detector::ConflictDetector;
pub use merge_base::estimate_merge_base;
