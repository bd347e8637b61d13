//! TOML-based configuration for branchconflicts.
//!
//! The GitHub token is never stored in the file: `github.token_env` names an
//! environment variable that is resolved at runtime via
//! [`AppConfig::resolve_env_vars`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::ConfigError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level application configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// GitHub repository and API settings.
    #[serde(default)]
    pub github: GitHubConfig,

    /// Local checkout settings.
    #[serde(default)]
    pub local: LocalConfig,

    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
}

// ---------------------------------------------------------------------------
// GitHub
// ---------------------------------------------------------------------------

/// GitHub repository and API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// GitHub API base URL (default `https://api.github.com`).
    #[serde(default = "default_github_api_url")]
    pub api_url: String,

    /// Repository in `owner/repo` format. Inferred from `local.remote` when
    /// empty.
    #[serde(default)]
    pub repo: String,

    /// Environment variable holding the GitHub personal access token.
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Resolved token (populated by `resolve_env_vars`).
    #[serde(skip)]
    pub token: Option<String>,
}

fn default_github_api_url() -> String {
    "https://api.github.com".into()
}
fn default_token_env() -> String {
    "GITHUB_TOKEN".into()
}
fn default_timeout() -> u64 {
    30
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_github_api_url(),
            repo: String::new(),
            token_env: default_token_env(),
            timeout_secs: default_timeout(),
            token: None,
        }
    }
}

impl GitHubConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// Local checkout
// ---------------------------------------------------------------------------

/// How the local tree diff is computed.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DiffBackend {
    /// In-process via libgit2.
    #[default]
    Git2,
    /// Spawn `git diff --name-only -r` in the repository root.
    Cli,
}

impl std::fmt::Display for DiffBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Git2 => write!(f, "git2"),
            Self::Cli => write!(f, "cli"),
        }
    }
}

impl std::str::FromStr for DiffBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "git2" => Ok(Self::Git2),
            "cli" => Ok(Self::Cli),
            other => Err(ConfigError::InvalidValue {
                field: "local.diff_backend".into(),
                detail: format!("expected 'git2' or 'cli', got '{}'", other),
            }),
        }
    }
}

/// Local checkout configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalConfig {
    /// Root of the local checkout (default: current directory).
    #[serde(default = "default_repo_path")]
    pub repo_path: PathBuf,

    /// Remote whose URL supplies `github.repo` when that is left empty.
    #[serde(default = "default_remote")]
    pub remote: String,

    /// Tree diff implementation.
    #[serde(default)]
    pub diff_backend: DiffBackend,

    /// `git` executable used by the `cli` backend.
    #[serde(default = "default_git_binary")]
    pub git_binary: String,
}

fn default_repo_path() -> PathBuf {
    PathBuf::from(".")
}
fn default_remote() -> String {
    "origin".into()
}
fn default_git_binary() -> String {
    "git".into()
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            repo_path: default_repo_path(),
            remote: default_remote(),
            diff_backend: DiffBackend::default(),
            git_binary: default_git_binary(),
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Minimum tracing level when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".into()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading & resolving
// ---------------------------------------------------------------------------

impl AppConfig {
    /// Load an [`AppConfig`] from a TOML file at the given path.
    ///
    /// This does **not** resolve environment variables -- call
    /// [`resolve_env_vars`](Self::resolve_env_vars) afterwards.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Resolve the GitHub token from the environment. A missing token is not
    /// an error; requests are then sent unauthenticated.
    pub fn resolve_env_vars(&mut self) {
        self.github.token = resolve_optional_env(&self.github.token_env, "github.token_env");
    }

    /// Validate that all required fields are present and sane.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.github.api_url.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "github.api_url".into(),
                detail: "API URL must not be empty".into(),
            });
        }
        if self.github.repo.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "github.repo".into(),
                detail: "GitHub repo must not be empty".into(),
            });
        }
        let mut parts = self.github.repo.split('/');
        let well_formed = matches!(
            (parts.next(), parts.next(), parts.next()),
            (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty()
        );
        if !well_formed {
            return Err(ConfigError::InvalidValue {
                field: "github.repo".into(),
                detail: "GitHub repo must be in 'owner/repo' format".into(),
            });
        }
        if self.github.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "github.timeout_secs".into(),
                detail: "timeout must be > 0".into(),
            });
        }
        if self.local.repo_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "local.repo_path".into(),
                detail: "repository path must not be empty".into(),
            });
        }
        if self.local.diff_backend == DiffBackend::Cli && self.local.git_binary.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "local.git_binary".into(),
                detail: "git binary must not be empty when diff_backend = \"cli\"".into(),
            });
        }

        Ok(())
    }
}

/// Try to read an environment variable by name. Returns `Some(value)` on
/// success; logs a warning and returns `None` if the variable is unset.
fn resolve_optional_env(env_name: &str, field: &str) -> Option<String> {
    match std::env::var(env_name) {
        Ok(val) if !val.is_empty() => {
            debug!(field, env_name, "resolved env var");
            Some(val)
        }
        Ok(_) => {
            warn!(field, env_name, "env var is set but empty");
            None
        }
        Err(_) => {
            warn!(field, env_name, "env var not set");
            None
        }
    }
}
