//! GitHub REST API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::errors::GitHubError;
use crate::models::{Branch, Commit};
use crate::source::{RemoteRepository, BRANCH_PAGE_SIZE};

/// GitHub stops listing files in a comparison at this many entries.
const COMPARE_FILE_CAP: usize = 300;

/// Entry of `GET /repos/{owner}/{repo}/branches`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubBranch {
    pub name: String,
    pub commit: GitHubCommitRef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubCommitRef {
    pub sha: String,
}

/// Response of `GET /repos/{owner}/{repo}/commits/{sha}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubCommit {
    pub sha: String,
    pub commit: GitHubCommitDetail,
    #[serde(default)]
    pub parents: Vec<GitHubCommitRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubCommitDetail {
    pub message: String,
}

/// Response of `GET /repos/{owner}/{repo}/compare/{base}...{head}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubComparison {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub files: Vec<GitHubChangedFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubChangedFile {
    pub filename: String,
    #[serde(default)]
    pub status: Option<String>,
    /// Source path of a rename.
    #[serde(default)]
    pub previous_filename: Option<String>,
}

impl GitHubComparison {
    /// Every path the comparison touches. A rename yields both its old and
    /// new path, matching a tree diff without rename detection.
    pub fn changed_paths(self) -> Vec<String> {
        self.files
            .into_iter()
            .flat_map(|f| std::iter::once(f.filename).chain(f.previous_filename))
            .collect()
    }
}

/// Asynchronous GitHub REST API client scoped to one `owner/repo`.
#[derive(Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    repo: String,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(
        api_url: impl Into<String>,
        repo: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, GitHubError> {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        let repo = repo.into();
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("branchconflicts/", env!("CARGO_PKG_VERSION"))),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;
        info!(api_url = %api_url, repo = %repo, authenticated = token.is_some(), "created GitHubClient");
        Ok(Self {
            http,
            api_url,
            repo,
            token,
        })
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let req = self.http.get(url);
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Turn a non-success response into an error. `what` names the resource
    /// for the definitive not-found case.
    async fn check_response(
        resp: reqwest::Response,
        what: impl FnOnce() -> String,
    ) -> Result<reqwest::Response, GitHubError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        // GitHub answers 422 for syntactically valid but unknown SHAs.
        if status == StatusCode::NOT_FOUND || status == StatusCode::UNPROCESSABLE_ENTITY {
            return Err(GitHubError::NotFound { what: what() });
        }
        let rate_limited = status == StatusCode::TOO_MANY_REQUESTS
            || (status == StatusCode::FORBIDDEN
                && resp
                    .headers()
                    .get("x-ratelimit-remaining")
                    .is_some_and(|v| v.as_bytes() == b"0"));
        let reset_at = resp
            .headers()
            .get("x-ratelimit-reset")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();
        let unauthorized = status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN;

        let body = resp.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), "GitHub API request failed");
        let status = status.as_u16();
        Err(if rate_limited {
            GitHubError::RateLimited {
                status,
                reset_at,
                body,
            }
        } else if unauthorized {
            GitHubError::AuthenticationFailed { status, body }
        } else {
            GitHubError::ApiError { status, body }
        })
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<T, GitHubError> {
        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| GitHubError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl RemoteRepository for GitHubClient {
    #[instrument(skip(self), fields(repo = %self.repo))]
    async fn list_branches(&self, page: u32) -> Result<Vec<Branch>, GitHubError> {
        let url = format!("{}/repos/{}/branches", self.api_url, self.repo);
        let per_page = BRANCH_PAGE_SIZE.to_string();
        let page_str = page.to_string();
        let resp = self
            .get(&url)
            .query(&[("per_page", per_page.as_str()), ("page", page_str.as_str())])
            .send()
            .await?;
        let resp = Self::check_response(resp, || format!("repository '{}'", self.repo)).await?;
        let branches: Vec<GitHubBranch> = Self::decode(resp).await?;
        debug!(count = branches.len(), page, "fetched branches");
        Ok(branches
            .into_iter()
            .map(|b| Branch::new(b.name, b.commit.sha))
            .collect())
    }

    #[instrument(skip(self), fields(repo = %self.repo))]
    async fn get_commit(&self, id: &str) -> Result<Commit, GitHubError> {
        let url = format!("{}/repos/{}/commits/{}", self.api_url, self.repo, id);
        let resp = self.get(&url).send().await?;
        let resp = Self::check_response(resp, || format!("commit '{}'", id)).await?;
        let commit: GitHubCommit = Self::decode(resp).await?;
        debug!(sha = %commit.sha, parents = commit.parents.len(), "fetched commit details");
        Ok(Commit::new(
            commit.sha,
            commit.commit.message,
            commit.parents.into_iter().map(|p| p.sha).collect(),
        ))
    }

    #[instrument(skip(self), fields(repo = %self.repo))]
    async fn compare(&self, ancestor: &str, endpoint: &str) -> Result<Vec<String>, GitHubError> {
        let url = format!(
            "{}/repos/{}/compare/{}...{}",
            self.api_url, self.repo, ancestor, endpoint
        );
        let resp = self.get(&url).send().await?;
        let resp =
            Self::check_response(resp, || format!("comparison '{}...{}'", ancestor, endpoint))
                .await?;
        let comparison: GitHubComparison = Self::decode(resp).await?;
        if comparison.files.len() >= COMPARE_FILE_CAP {
            warn!(
                count = comparison.files.len(),
                "comparison hit GitHub's file listing cap; remote change set may be truncated"
            );
        }
        debug!(
            count = comparison.files.len(),
            status = comparison.status.as_deref().unwrap_or("unknown"),
            "fetched comparison"
        );
        Ok(comparison.changed_paths())
    }
}
