//! Local repository access: branch reflogs and tree diffs.

use std::path::{Component, Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use git2::{ErrorCode, Repository};
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

use crate::config::DiffBackend;
use crate::errors::LocalError;
use crate::source::LocalRepository;

/// Accessor for an on-disk repository rooted at `repo_path`.
///
/// Nothing here touches the process working directory: the git2 backend
/// works on the repository directly and the CLI backend sets the child's
/// working directory only.
#[derive(Debug, Clone)]
pub struct LocalRepo {
    repo_path: PathBuf,
    git_dir: PathBuf,
    backend: DiffBackend,
    git_binary: String,
}

impl LocalRepo {
    /// Open the repository at `repo_path` (a working tree or a bare repo).
    pub fn new<P: AsRef<Path>>(
        repo_path: P,
        backend: DiffBackend,
        git_binary: impl Into<String>,
    ) -> Result<Self, LocalError> {
        let path = repo_path.as_ref();
        info!(path = %path.display(), backend = %backend, "opening local repository");
        let repo = Repository::open(path)
            .map_err(|_| LocalError::RepositoryNotFound(path.display().to_string()))?;
        Ok(Self {
            repo_path: path.to_path_buf(),
            git_dir: repo.path().to_path_buf(),
            backend,
            git_binary: git_binary.into(),
        })
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    /// URL of the named remote, or `None` if the checkout has no such remote.
    pub fn remote_url(&self, name: &str) -> Result<Option<String>, LocalError> {
        let repo = Repository::open(&self.git_dir)?;
        let url = match repo.find_remote(name) {
            Ok(remote) => remote.url().map(str::to_string),
            Err(e) if e.code() == ErrorCode::NotFound => None,
            Err(e) => return Err(e.into()),
        };
        Ok(url)
    }

    /// Location of the reflog for a local branch. Names that could escape
    /// the reflog directory resolve to nothing.
    pub fn reflog_path(&self, branch: &str) -> Option<PathBuf> {
        let relative = Path::new(branch);
        let well_formed = !branch.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !well_formed {
            return None;
        }
        Some(self.git_dir.join("logs").join("refs").join("heads").join(relative))
    }

    async fn read_log(&self, branch: &str) -> Result<Vec<String>, LocalError> {
        let not_found = |path: PathBuf| LocalError::BranchNotFound {
            branch: branch.to_string(),
            path,
        };
        let path = self
            .reflog_path(branch)
            .ok_or_else(|| not_found(PathBuf::from(branch)))?;

        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(not_found(path)),
            // `feature` when only `feature/x` exists.
            Err(_) if path.is_dir() => return Err(not_found(path)),
            Err(e) => return Err(e.into()),
        };

        let lines: Vec<String> = contents
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(str::to_string)
            .collect();
        if lines.is_empty() {
            return Err(LocalError::EmptyHistory {
                branch: branch.to_string(),
            });
        }
        debug!(branch, count = lines.len(), "read reflog");
        Ok(lines)
    }

    async fn diff_with_cli(&self, endpoint: &str, ancestor: &str) -> Result<Vec<String>, LocalError> {
        let output = Command::new(&self.git_binary)
            .current_dir(&self.repo_path)
            .args([
                "-c",
                "core.quotepath=off",
                "diff",
                "--no-ext-diff",
                "--name-only",
                "--no-renames",
                "-r",
                ancestor,
                endpoint,
                "--",
            ])
            .stdin(Stdio::null())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(%stderr, "git diff failed");
            if is_unknown_revision(&stderr) {
                return Err(LocalError::RevisionNotFound(format!(
                    "{}...{}",
                    ancestor, endpoint
                )));
            }
            return Err(LocalError::DiffFailed {
                exit_code: output.status.code().unwrap_or(-1),
                stderr,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }
}

#[async_trait]
impl LocalRepository for LocalRepo {
    #[instrument(skip(self))]
    async fn read_last_log_line(&self, branch: &str) -> Result<String, LocalError> {
        let mut lines = self.read_log(branch).await?;
        lines.pop().ok_or_else(|| LocalError::EmptyHistory {
            branch: branch.to_string(),
        })
    }

    #[instrument(skip(self))]
    async fn read_log_lines(&self, branch: &str) -> Result<Vec<String>, LocalError> {
        self.read_log(branch).await
    }

    #[instrument(skip(self), fields(backend = %self.backend))]
    async fn tree_diff(&self, endpoint: &str, ancestor: &str) -> Result<Vec<String>, LocalError> {
        let paths = match self.backend {
            DiffBackend::Git2 => {
                let git_dir = self.git_dir.clone();
                let endpoint = endpoint.to_string();
                let ancestor = ancestor.to_string();
                tokio::task::spawn_blocking(move || diff_with_git2(&git_dir, &endpoint, &ancestor))
                    .await
                    .map_err(|e| LocalError::IoError(std::io::Error::other(e)))??
            }
            DiffBackend::Cli => self.diff_with_cli(endpoint, ancestor).await?,
        };
        debug!(count = paths.len(), "computed tree diff");
        Ok(paths)
    }
}

fn diff_with_git2(git_dir: &Path, endpoint: &str, ancestor: &str) -> Result<Vec<String>, LocalError> {
    let repo = Repository::open(git_dir)?;
    let old_tree = resolve_tree(&repo, ancestor)?;
    let new_tree = resolve_tree(&repo, endpoint)?;
    let diff = repo.diff_tree_to_tree(Some(&old_tree), Some(&new_tree), None)?;
    Ok(diff
        .deltas()
        .filter_map(|delta| {
            delta
                .new_file()
                .path()
                .or_else(|| delta.old_file().path())
                .map(|p| p.to_string_lossy().into_owned())
        })
        .collect())
}

fn resolve_tree<'r>(repo: &'r Repository, rev: &str) -> Result<git2::Tree<'r>, LocalError> {
    let object = repo.revparse_single(rev).map_err(|e| match e.code() {
        ErrorCode::NotFound | ErrorCode::InvalidSpec | ErrorCode::Ambiguous => {
            LocalError::RevisionNotFound(rev.to_string())
        }
        _ => LocalError::Git2Error(e),
    })?;
    Ok(object.peel_to_tree()?)
}

fn is_unknown_revision(stderr: &str) -> bool {
    ["unknown revision", "bad revision", "bad object", "ambiguous argument"]
        .iter()
        .any(|needle| stderr.contains(needle))
}
