//! Error types for the branchconflicts core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them for callers that want a single
//! error type. [`CoreError::kind`] collapses every variant onto the small set
//! of outcomes a caller actually branches on.

use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Error kinds
// ---------------------------------------------------------------------------

/// Coarse classification of a pipeline failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A branch, commit, reflog or comparison endpoint does not exist.
    NotFound,
    /// A reflog exists but records no usable entries.
    EmptyHistory,
    /// Network, timeout, auth, rate limit, non-definitive API failure, or a
    /// local diff tool failure.
    Transport,
    /// A reflog line has fewer fields than the format requires.
    AmbiguousInput,
    /// Configuration could not be loaded or is invalid.
    Config,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::EmptyHistory => write!(f, "empty_history"),
            Self::Transport => write!(f, "transport"),
            Self::AmbiguousInput => write!(f, "ambiguous_input"),
            Self::Config => write!(f, "config"),
        }
    }
}

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    GitHub(#[from] GitHubError),

    #[error(transparent)]
    Local(#[from] LocalError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::GitHub(e) => e.kind(),
            Self::Local(e) => e.kind(),
            Self::Config(_) => ErrorKind::Config,
        }
    }
}

// ---------------------------------------------------------------------------
// GitHub API errors
// ---------------------------------------------------------------------------

/// Errors from GitHub REST API interactions.
#[derive(Debug, Error)]
pub enum GitHubError {
    /// HTTP-level transport error (network, TLS, timeout, body decoding).
    #[error("GitHub HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The API definitively reported that the resource does not exist.
    #[error("{what} not found on GitHub")]
    NotFound { what: String },

    /// The API returned a non-success status code.
    #[error("GitHub API error (HTTP {status}): {body}")]
    ApiError { status: u16, body: String },

    /// Authentication token is missing or invalid.
    #[error("GitHub authentication failed (HTTP {status}): {body}")]
    AuthenticationFailed { status: u16, body: String },

    /// Rate limit exceeded.
    #[error("GitHub rate limit exceeded (HTTP {status}), resets at {reset_at}: {body}")]
    RateLimited {
        status: u16,
        reset_at: String,
        body: String,
    },

    /// JSON deserialization failure.
    #[error("GitHub response parse error: {0}")]
    ParseError(String),
}

impl GitHubError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            _ => ErrorKind::Transport,
        }
    }
}

// ---------------------------------------------------------------------------
// Local repository errors
// ---------------------------------------------------------------------------

/// Errors from the local repository accessor (reflogs and tree diffs).
#[derive(Debug, Error)]
pub enum LocalError {
    /// No reflog exists for the branch.
    #[error("local branch '{branch}' not found (no reflog at '{}')", .path.display())]
    BranchNotFound { branch: String, path: PathBuf },

    /// The reflog exists but has no entries to derive a commit from.
    #[error("local branch '{branch}' has no recorded history")]
    EmptyHistory { branch: String },

    /// A reflog line has too few whitespace-delimited fields.
    #[error("malformed reflog line for branch '{branch}': expected at least {expected} fields, found {found} in {line:?}")]
    MalformedLogLine {
        branch: String,
        line: String,
        expected: usize,
        found: usize,
    },

    /// A revision handed to the tree diff does not exist locally.
    #[error("git revision not found: {0}")]
    RevisionNotFound(String),

    /// The repository path does not exist or is not a git repository.
    #[error("git repository not found at '{0}'")]
    RepositoryNotFound(String),

    /// The `git diff` child process exited with a failure status.
    #[error("git diff failed (exit {exit_code}): {stderr}")]
    DiffFailed { exit_code: i32, stderr: String },

    /// A `git2` library error.
    #[error("git2 error: {0}")]
    Git2Error(#[from] git2::Error),

    /// Generic I/O wrapper.
    #[error("local repository I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl LocalError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BranchNotFound { .. }
            | Self::RevisionNotFound(_)
            | Self::RepositoryNotFound(_) => ErrorKind::NotFound,
            Self::EmptyHistory { .. } => ErrorKind::EmptyHistory,
            Self::MalformedLogLine { .. } => ErrorKind::AmbiguousInput,
            Self::DiffFailed { .. } | Self::Git2Error(_) | Self::IoError(_) => {
                ErrorKind::Transport
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
