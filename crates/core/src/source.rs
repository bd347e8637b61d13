//! Capabilities the resolvers consume.
//!
//! [`RemoteRepository`] is implemented by [`GitHubClient`](crate::git::GitHubClient)
//! and [`LocalRepository`] by [`LocalRepo`](crate::git::LocalRepo). Tests plug
//! in-memory fakes into the same seams.

use async_trait::async_trait;

use crate::errors::{GitHubError, LocalError};
use crate::models::{Branch, Commit};

/// Number of branches requested per listing page.
pub const BRANCH_PAGE_SIZE: usize = 100;

/// Read access to a repository hosted behind a REST API.
#[async_trait]
pub trait RemoteRepository: Send + Sync {
    /// One page (1-based) of the repository's branches, at most
    /// [`BRANCH_PAGE_SIZE`] entries. A short page is the last page.
    async fn list_branches(&self, page: u32) -> Result<Vec<Branch>, GitHubError>;

    /// A single commit by id. The returned id is the API's canonical form.
    async fn get_commit(&self, id: &str) -> Result<Commit, GitHubError>;

    /// Paths that differ between `ancestor` and `endpoint`
    /// (three-dot compare, ancestor first).
    async fn compare(&self, ancestor: &str, endpoint: &str) -> Result<Vec<String>, GitHubError>;
}

/// Read access to an on-disk repository.
#[async_trait]
pub trait LocalRepository: Send + Sync {
    /// Last non-blank line of the branch's reflog.
    async fn read_last_log_line(&self, branch: &str) -> Result<String, LocalError>;

    /// Every non-blank line of the branch's reflog, oldest first.
    async fn read_log_lines(&self, branch: &str) -> Result<Vec<String>, LocalError>;

    /// Paths that differ between the two trees. Implementations diff from
    /// `ancestor` to `endpoint`.
    async fn tree_diff(&self, endpoint: &str, ancestor: &str) -> Result<Vec<String>, LocalError>;
}
