//! Approximate merge-base estimation.
//!
//! This is not a graph walk. The estimate is the first remote parent id that
//! also appears among the local parent ids. Local parent ids come from the
//! branch reflog (see [`crate::resolver`]), so the answer is only right when
//! the reflog happens to record a commit that is a true common ancestor.

use std::collections::HashSet;

use tracing::debug;

use crate::models::Commit;

/// First id in `remote.parent_ids` (in order) that also appears anywhere in
/// `local.parent_ids`, or `None` when the lists are disjoint.
pub fn estimate_merge_base(remote: &Commit, local: &Commit) -> Option<String> {
    let local_ids: HashSet<&str> = local.parent_ids.iter().map(String::as_str).collect();
    let base = remote
        .parent_ids
        .iter()
        .find(|id| local_ids.contains(id.as_str()))
        .cloned();
    debug!(
        remote = %remote.id,
        local = %local.id,
        merge_base = base.as_deref().unwrap_or("none"),
        "estimated merge base"
    );
    base
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit(id: &str, parents: &[&str]) -> Commit {
        Commit::new(id, "", parents.iter().map(|p| p.to_string()).collect())
    }

    #[test]
    fn test_disjoint_parents() {
        let remote = commit("r", &["a", "b"]);
        let local = commit("l", &["c", "d"]);
        assert_eq!(estimate_merge_base(&remote, &local), None);
    }

    #[test]
    fn test_empty_parents() {
        assert_eq!(estimate_merge_base(&commit("r", &[]), &commit("l", &["a"])), None);
        assert_eq!(estimate_merge_base(&commit("r", &["a"]), &commit("l", &[])), None);
    }

    #[test]
    fn test_first_shared_in_remote_order() {
        // Both `b` and `c` are shared; `b` comes first in the remote list even
        // though `c` comes first locally.
        let remote = commit("r", &["a", "b", "c"]);
        let local = commit("l", &["c", "x", "b"]);
        assert_eq!(estimate_merge_base(&remote, &local).as_deref(), Some("b"));
    }

    #[test]
    fn test_merge_commit_second_parent() {
        let remote = commit("m", &["mainline", "topic"]);
        let local = commit("l", &["p0", "topic"]);
        assert_eq!(estimate_merge_base(&remote, &local).as_deref(), Some("topic"));
    }
}
