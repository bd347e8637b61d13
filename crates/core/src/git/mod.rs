//! Git access for branchconflicts: the GitHub API and the local checkout.

pub mod client;
pub mod github;
pub mod reflog;
pub mod remote_url;

pub use client::LocalRepo;
pub use github::GitHubClient;
