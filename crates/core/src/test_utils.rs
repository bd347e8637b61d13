//! In-memory repositories for unit tests.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use crate::errors::{GitHubError, LocalError};
use crate::models::{Branch, Commit};
use crate::source::{LocalRepository, RemoteRepository, BRANCH_PAGE_SIZE};

/// Remote side backed by maps; unknown ids answer like GitHub's 404.
#[derive(Default)]
pub struct FakeRemote {
    branches: Vec<Branch>,
    commits: HashMap<String, Commit>,
    comparisons: HashMap<(String, String), Vec<String>>,
    failure_status: Option<u16>,
    pages: AtomicU32,
}

impl FakeRemote {
    pub fn with_branch(mut self, name: &str, sha: &str) -> Self {
        self.branches.push(Branch::new(name, sha));
        self
    }

    pub fn with_commit(mut self, commit: Commit) -> Self {
        self.commits.insert(commit.id.clone(), commit);
        self
    }

    pub fn with_comparison(mut self, ancestor: &str, endpoint: &str, files: &[&str]) -> Self {
        self.comparisons.insert(
            (ancestor.to_string(), endpoint.to_string()),
            files.iter().map(|f| f.to_string()).collect(),
        );
        self
    }

    /// Make every call fail with a non-definitive API error.
    pub fn failing(mut self, status: u16) -> Self {
        self.failure_status = Some(status);
        self
    }

    pub fn pages_requested(&self) -> u32 {
        self.pages.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), GitHubError> {
        match self.failure_status {
            Some(status) => Err(GitHubError::ApiError {
                status,
                body: "fake failure".into(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RemoteRepository for FakeRemote {
    async fn list_branches(&self, page: u32) -> Result<Vec<Branch>, GitHubError> {
        self.check()?;
        self.pages.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .branches
            .iter()
            .skip(page.saturating_sub(1) as usize * BRANCH_PAGE_SIZE)
            .take(BRANCH_PAGE_SIZE)
            .cloned()
            .collect())
    }

    async fn get_commit(&self, id: &str) -> Result<Commit, GitHubError> {
        self.check()?;
        self.commits
            .get(id)
            .cloned()
            .ok_or_else(|| GitHubError::NotFound {
                what: format!("commit '{}'", id),
            })
    }

    async fn compare(&self, ancestor: &str, endpoint: &str) -> Result<Vec<String>, GitHubError> {
        self.check()?;
        self.comparisons
            .get(&(ancestor.to_string(), endpoint.to_string()))
            .cloned()
            .ok_or_else(|| GitHubError::NotFound {
                what: format!("comparison '{}...{}'", ancestor, endpoint),
            })
    }
}

/// Local side backed by maps; mirrors `LocalRepo`'s missing/empty handling.
#[derive(Default)]
pub struct FakeLocal {
    reflogs: HashMap<String, Vec<String>>,
    diffs: HashMap<(String, String), Vec<String>>,
}

impl FakeLocal {
    pub fn with_reflog(mut self, branch: &str, lines: &[&str]) -> Self {
        self.reflogs.insert(
            branch.to_string(),
            lines.iter().map(|l| l.to_string()).collect(),
        );
        self
    }

    pub fn with_diff(mut self, endpoint: &str, ancestor: &str, files: &[&str]) -> Self {
        self.diffs.insert(
            (endpoint.to_string(), ancestor.to_string()),
            files.iter().map(|f| f.to_string()).collect(),
        );
        self
    }

    fn log(&self, branch: &str) -> Result<Vec<String>, LocalError> {
        let lines = self
            .reflogs
            .get(branch)
            .ok_or_else(|| LocalError::BranchNotFound {
                branch: branch.to_string(),
                path: PathBuf::from(format!(".git/logs/refs/heads/{}", branch)),
            })?;
        if lines.is_empty() {
            return Err(LocalError::EmptyHistory {
                branch: branch.to_string(),
            });
        }
        Ok(lines.clone())
    }
}

#[async_trait]
impl LocalRepository for FakeLocal {
    async fn read_last_log_line(&self, branch: &str) -> Result<String, LocalError> {
        let mut lines = self.log(branch)?;
        lines.pop().ok_or_else(|| LocalError::EmptyHistory {
            branch: branch.to_string(),
        })
    }

    async fn read_log_lines(&self, branch: &str) -> Result<Vec<String>, LocalError> {
        self.log(branch)
    }

    async fn tree_diff(&self, endpoint: &str, ancestor: &str) -> Result<Vec<String>, LocalError> {
        self.diffs
            .get(&(endpoint.to_string(), ancestor.to_string()))
            .cloned()
            .ok_or_else(|| LocalError::RevisionNotFound(format!("{}...{}", ancestor, endpoint)))
    }
}

mod tests {
    use super::*;

    #[tokio::test]
    async fn test_page_zero_is_treated_as_first_page() {
        let remote = FakeRemote::default()
            .with_branch("main", "a1")
            .with_branch("dev", "b2");
        let first = remote.list_branches(1).await.unwrap();
        let zero = remote.list_branches(0).await.unwrap();
        assert_eq!(zero, first);
        assert_eq!(remote.pages_requested(), 2);
    }
}
