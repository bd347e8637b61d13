//! Conflict check pipeline.
//!
//! The [`ConflictEngine`] runs one check end to end:
//!
//! 1. Resolve the remote and local branch tips.
//! 2. Resolve both tips' commit metadata.
//! 3. Estimate the merge base from the two parent id lists.
//! 4. Build both change sets anchored at that merge base.
//! 5. Intersect them.
//!
//! Any resolution failure aborts the check. A missing merge base is not a
//! failure: the report comes back with `merge_base: None` and empty sets.

use tracing::{info, instrument, warn};

use crate::config::AppConfig;
use crate::conflict::{estimate_merge_base, ConflictDetector};
use crate::errors::CoreError;
use crate::git::remote_url::repo_slug_from_url;
use crate::git::{GitHubClient, LocalRepo};
use crate::models::{ConflictReport, ModifiedFileSet, Side};
use crate::resolver::Resolver;
use crate::source::{LocalRepository, RemoteRepository};

/// Runs conflict checks between one remote and one local repository.
pub struct ConflictEngine<R, L> {
    remote: R,
    local: L,
}

impl ConflictEngine<GitHubClient, LocalRepo> {
    /// Build an engine talking to GitHub and the configured checkout.
    ///
    /// An empty `github.repo` is filled in from the URL of `local.remote`.
    pub fn from_config(config: &AppConfig) -> Result<Self, CoreError> {
        let local = LocalRepo::new(
            &config.local.repo_path,
            config.local.diff_backend,
            config.local.git_binary.clone(),
        )?;

        let mut config = config.clone();
        if config.github.repo.is_empty() {
            if let Some(slug) = local
                .remote_url(&config.local.remote)?
                .as_deref()
                .and_then(repo_slug_from_url)
            {
                info!(remote = %config.local.remote, repo = %slug, "inferred GitHub repository");
                config.github.repo = slug;
            }
        }
        config.validate()?;

        let remote = GitHubClient::new(
            config.github.api_url.clone(),
            config.github.repo.clone(),
            config.github.token.clone(),
            config.github.timeout(),
        )?;
        Ok(Self::new(remote, local))
    }
}

impl<R, L> ConflictEngine<R, L>
where
    R: RemoteRepository,
    L: LocalRepository,
{
    pub fn new(remote: R, local: L) -> Self {
        info!("initializing conflict engine");
        Self { remote, local }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn local(&self) -> &L {
        &self.local
    }

    /// Files modified on both `remote_branch` and `local_branch` since their
    /// estimated merge base.
    #[instrument(skip(self))]
    pub async fn check(
        &self,
        remote_branch: &str,
        local_branch: &str,
    ) -> Result<ConflictReport, CoreError> {
        let resolver = Resolver::new(&self.remote, &self.local);

        let remote_tip = resolver.branch(Side::Remote, remote_branch).await?;
        let local_tip = resolver.branch(Side::Local, local_branch).await?;
        info!(
            remote = %remote_tip.tip_commit_id,
            local = %local_tip.tip_commit_id,
            "resolved branch tips"
        );

        let remote_commit = resolver.commit(Side::Remote, &remote_tip).await?;
        let local_commit = resolver.commit(Side::Local, &local_tip).await?;

        let Some(merge_base) = estimate_merge_base(&remote_commit, &local_commit) else {
            warn!(
                remote_branch,
                local_branch, "no common ancestor found among recorded parent ids"
            );
            return Ok(ConflictReport {
                remote_branch: remote_tip,
                local_branch: local_tip,
                merge_base: None,
                remote_changes: ModifiedFileSet::new(),
                local_changes: ModifiedFileSet::new(),
                conflicts: ModifiedFileSet::new(),
            });
        };
        info!(merge_base = %merge_base, "estimated merge base");

        // Diff from the tips the branches were resolved to, not the commit
        // ids echoed back by the API, so both sides use the same endpoints.
        let remote_changes = resolver
            .modified_files(Side::Remote, &remote_tip.tip_commit_id, &merge_base)
            .await?;
        let local_changes = resolver
            .modified_files(Side::Local, &local_tip.tip_commit_id, &merge_base)
            .await?;

        let conflicts = ConflictDetector::detect(&local_changes, &remote_changes);
        info!(count = conflicts.len(), "conflict check complete");

        Ok(ConflictReport {
            remote_branch: remote_tip,
            local_branch: local_tip,
            merge_base: Some(merge_base),
            remote_changes,
            local_changes,
            conflicts,
        })
    }
}
