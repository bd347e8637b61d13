//! Branch, commit and change-set resolution against either side.
//!
//! The local commit resolver derives `parent_ids` from the branch reflog: the
//! header line is skipped and the *old* id of every remaining entry is
//! appended, in order. Those ids are whatever the branch pointed at before
//! each update (commits, resets, rebases), so the list approximates the
//! branch's history rather than the commit's real parents. The merge-base
//! estimator depends on exactly this list.

use tracing::{debug, instrument};

use crate::errors::{CoreError, GitHubError, LocalError};
use crate::git::reflog::ReflogEntry;
use crate::models::{Branch, Commit, ModifiedFileSet, Side};
use crate::source::{LocalRepository, RemoteRepository, BRANCH_PAGE_SIZE};

/// Resolves branches, commits and change sets from a remote and a local
/// repository.
pub struct Resolver<'a, R: ?Sized, L: ?Sized> {
    remote: &'a R,
    local: &'a L,
}

impl<'a, R, L> Resolver<'a, R, L>
where
    R: RemoteRepository + ?Sized,
    L: LocalRepository + ?Sized,
{
    pub fn new(remote: &'a R, local: &'a L) -> Self {
        Self { remote, local }
    }

    // -- Branches -------------------------------------------------------------

    pub async fn branch(&self, side: Side, name: &str) -> Result<Branch, CoreError> {
        match side {
            Side::Remote => self.remote_branch(name).await,
            Side::Local => self.local_branch(name).await,
        }
    }

    /// Find `name` in the remote branch listing, page by page.
    #[instrument(skip(self))]
    pub async fn remote_branch(&self, name: &str) -> Result<Branch, CoreError> {
        let mut page = 1;
        loop {
            let branches = self.remote.list_branches(page).await?;
            let last_page = branches.len() < BRANCH_PAGE_SIZE;
            if let Some(branch) = branches.into_iter().find(|b| b.name == name) {
                debug!(tip = %branch.tip_commit_id, page, "resolved remote branch");
                return Ok(branch);
            }
            if last_page {
                return Err(GitHubError::NotFound {
                    what: format!("branch '{}'", name),
                }
                .into());
            }
            page += 1;
        }
    }

    /// The tip is the new id on the last line of the branch reflog.
    #[instrument(skip(self))]
    pub async fn local_branch(&self, name: &str) -> Result<Branch, CoreError> {
        let line = self.local.read_last_log_line(name).await?;
        let entry = ReflogEntry::parse(name, &line)?;
        debug!(tip = %entry.new_id, "resolved local branch");
        Ok(Branch::new(name, entry.new_id))
    }

    // -- Commits --------------------------------------------------------------

    pub async fn commit(&self, side: Side, branch: &Branch) -> Result<Commit, CoreError> {
        match side {
            Side::Remote => self.remote_commit(&branch.tip_commit_id).await,
            Side::Local => self.local_commit(&branch.name).await,
        }
    }

    #[instrument(skip(self))]
    pub async fn remote_commit(&self, id: &str) -> Result<Commit, CoreError> {
        Ok(self.remote.get_commit(id).await?)
    }

    #[instrument(skip(self))]
    pub async fn local_commit(&self, branch: &str) -> Result<Commit, CoreError> {
        let lines = self.local.read_log_lines(branch).await?;
        let commit = commit_from_reflog(branch, &lines)?;
        debug!(id = %commit.id, parents = commit.parent_ids.len(), "resolved local commit");
        Ok(commit)
    }

    // -- Change sets ----------------------------------------------------------

    /// Paths changed between `ancestor` and `endpoint` on one side.
    #[instrument(skip(self))]
    pub async fn modified_files(
        &self,
        side: Side,
        endpoint: &str,
        ancestor: &str,
    ) -> Result<ModifiedFileSet, CoreError> {
        let paths = match side {
            Side::Remote => self.remote.compare(ancestor, endpoint).await?,
            Side::Local => self.local.tree_diff(endpoint, ancestor).await?,
        };
        let set: ModifiedFileSet = paths.into_iter().collect();
        debug!(%side, count = set.len(), "built modified-file set");
        Ok(set)
    }
}

/// Build the branch's latest commit from its reflog lines (header included).
///
/// The id and message come from the last entry; `parent_ids` collects the
/// old id of every entry after the header.
pub fn commit_from_reflog(branch: &str, lines: &[String]) -> Result<Commit, LocalError> {
    let mut parent_ids = Vec::with_capacity(lines.len().saturating_sub(1));
    let mut last = None;
    for line in lines.iter().skip(1) {
        let ReflogEntry {
            old_id,
            new_id,
            message,
        } = ReflogEntry::parse(branch, line)?;
        parent_ids.push(old_id);
        last = Some((new_id, message));
    }
    let (id, message) = last.ok_or_else(|| LocalError::EmptyHistory {
        branch: branch.to_string(),
    })?;
    Ok(Commit::new(id, message, parent_ids))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::test_utils::{FakeLocal, FakeRemote};

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn test_commit_from_reflog_single_update() {
        let commit = commit_from_reflog(
            "feature",
            &lines(&["0000 p1 name email 0 branch: Created", "p1 c1 name email 0 message hello"]),
        )
        .unwrap();
        assert_eq!(commit, Commit::new("c1", "message hello", vec!["p1".into()]));
    }

    #[test]
    fn test_commit_from_reflog_accumulates_every_entry() {
        let commit = commit_from_reflog(
            "feature",
            &lines(&[
                "0000 a x x 0 created",
                "a b x x 0 one",
                "b c x x 0 two",
                "c d x x 0 three",
            ]),
        )
        .unwrap();
        assert_eq!(commit.id, "d");
        assert_eq!(commit.message, "three");
        assert_eq!(commit.parent_ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_commit_from_reflog_header_only_is_empty_history() {
        let err = commit_from_reflog("feature", &lines(&["0000 a x x 0 created"])).unwrap_err();
        assert!(matches!(err, LocalError::EmptyHistory { .. }));
    }

    #[test]
    fn test_commit_from_reflog_reset_drops_self_reference() {
        // Reset back to `a` after moving to `b`: `a` is both the tip and an old id.
        let commit = commit_from_reflog(
            "main",
            &lines(&["0000 a x x 0 created", "a b x x 0 commit", "b a x x 0 reset"]),
        )
        .unwrap();
        assert_eq!(commit.id, "a");
        assert_eq!(commit.parent_ids, vec!["b"]);
    }

    #[test]
    fn test_commit_from_reflog_malformed_line() {
        let err = commit_from_reflog("main", &lines(&["0000 a", "broken"])).unwrap_err();
        assert!(matches!(err, LocalError::MalformedLogLine { .. }));
    }

    #[tokio::test]
    async fn test_remote_branch_found_and_missing() {
        let remote = FakeRemote::default().with_branch("main", "abc123");
        let local = FakeLocal::default();
        let resolver = Resolver::new(&remote, &local);

        let branch = resolver.branch(Side::Remote, "main").await.unwrap();
        assert_eq!(branch, Branch::new("main", "abc123"));

        let err = resolver.branch(Side::Remote, "dev").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_remote_branch_on_later_page() {
        let mut remote = FakeRemote::default();
        for i in 0..(BRANCH_PAGE_SIZE + 5) {
            remote = remote.with_branch(&format!("b{}", i), &format!("sha{}", i));
        }
        let last = format!("b{}", BRANCH_PAGE_SIZE + 2);
        let local = FakeLocal::default();
        let resolver = Resolver::new(&remote, &local);

        let branch = resolver.remote_branch(&last).await.unwrap();
        assert_eq!(branch.tip_commit_id, format!("sha{}", BRANCH_PAGE_SIZE + 2));
        assert_eq!(remote.pages_requested(), 2);
    }

    #[tokio::test]
    async fn test_local_branch_distinguishes_missing_and_empty() {
        let remote = FakeRemote::default();
        let local = FakeLocal::default().with_reflog("empty", &[]);
        let resolver = Resolver::new(&remote, &local);

        let err = resolver.branch(Side::Local, "absent").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = resolver.branch(Side::Local, "empty").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyHistory);
    }

    #[tokio::test]
    async fn test_local_branch_and_commit() {
        let remote = FakeRemote::default();
        let local = FakeLocal::default().with_reflog(
            "feature",
            &["0000 p1 name email 0 branch: Created", "p1 c1 name email 0 message hello"],
        );
        let resolver = Resolver::new(&remote, &local);

        let branch = resolver.branch(Side::Local, "feature").await.unwrap();
        assert_eq!(branch, Branch::new("feature", "c1"));

        let commit = resolver.commit(Side::Local, &branch).await.unwrap();
        assert_eq!(commit.message, "message hello");
        assert_eq!(commit.id, "c1");
        assert_eq!(commit.parent_ids, vec!["p1"]);
    }

    #[tokio::test]
    async fn test_local_branch_malformed_last_line() {
        let remote = FakeRemote::default();
        let local = FakeLocal::default().with_reflog("main", &["0000 a x", "garbage"]);
        let resolver = Resolver::new(&remote, &local);
        let err = resolver.local_branch("main").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AmbiguousInput);
    }

    #[tokio::test]
    async fn test_remote_commit_uses_canonical_id() {
        let remote = FakeRemote::default().with_commit(Commit::new(
            "abc123",
            "Add feature",
            vec!["p0".into(), "p1".into()],
        ));
        let local = FakeLocal::default();
        let resolver = Resolver::new(&remote, &local);

        let commit = resolver
            .commit(Side::Remote, &Branch::new("main", "abc123"))
            .await
            .unwrap();
        assert_eq!(commit.parent_ids, vec!["p0", "p1"]);

        let err = resolver.remote_commit("nope").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_modified_files_dedupes() {
        let remote = FakeRemote::default().with_comparison("base", "tip", &["a", "b", "a"]);
        let local = FakeLocal::default().with_diff("tip", "base", &["x", "x"]);
        let resolver = Resolver::new(&remote, &local);

        let remote_set = resolver.modified_files(Side::Remote, "tip", "base").await.unwrap();
        assert_eq!(remote_set.into_iter().collect::<Vec<_>>(), vec!["a", "b"]);

        let local_set = resolver.modified_files(Side::Local, "tip", "base").await.unwrap();
        assert_eq!(local_set.len(), 1);

        let err = resolver
            .modified_files(Side::Remote, "tip", "other")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
