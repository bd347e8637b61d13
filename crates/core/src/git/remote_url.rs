//! Repository slug inference from git remote URLs.
//!
//! Lets the GitHub repository default to whatever the local checkout's remote
//! points at, so `github.repo` can be left out of the config.

/// Extract `owner/repo` from a remote URL.
///
/// Accepted forms:
/// - `https://github.com/owner/repo(.git)` (any host, optional credentials)
/// - `ssh://git@host[:port]/owner/repo(.git)`
/// - `git@host:owner/repo(.git)` (scp-like)
///
/// Enterprise hosts with path prefixes keep only the last two segments.
/// Returns `None` for local paths and anything without two segments.
pub fn repo_slug_from_url(url: &str) -> Option<String> {
    let url = url.trim();
    let path = if let Some((_, rest)) = url.split_once("://") {
        // Drop the authority (`user@host:port`).
        rest.split_once('/')?.1
    } else if let Some((authority, path)) = url.split_once(':') {
        // scp-like syntax has no slash before the colon.
        if authority.contains('/') || authority.is_empty() {
            return None;
        }
        path
    } else {
        return None;
    };

    let path = path.trim_end_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    let mut segments = path.rsplit('/').filter(|s| !s.is_empty());
    let repo = segments.next()?;
    let owner = segments.next()?;
    Some(format!("{}/{}", owner, repo))
}
