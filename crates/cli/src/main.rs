//! branchconflicts command-line tool.
//!
//! Compares a GitHub branch with a local branch and lists the files both
//! sides modified since their estimated merge base. Also generates and
//! validates the configuration file.

mod style;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use branchconflicts_core::config::{AppConfig, DiffBackend};
use branchconflicts_core::{ConflictEngine, ConflictReport};

const DEFAULT_LOG_LEVEL: &str = "warn";

/// Exit status when the check ran and found conflicting files.
const EXIT_CONFLICTS: u8 = 2;

/// Exit status when the branches share no recorded ancestor, so nothing was
/// compared.
const EXIT_NO_MERGE_BASE: u8 = 3;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// Early warning for files modified on both a GitHub branch and a local branch.
#[derive(Parser, Debug)]
#[command(name = "branchconflicts", version, about)]
struct Cli {
    /// Path to the TOML configuration file
    /// (default: ~/.config/branchconflicts/config.toml, optional).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List files modified on both branches since their merge base.
    ///
    /// Exits 0 when clean, 2 when conflicts were found and 3 when the
    /// branches share no recorded ancestor.
    Check(CheckArgs),

    /// Generate a default configuration file.
    Init {
        /// Output path (default: the default config location).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },

    /// Validate the configuration file.
    Validate,
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Branch on GitHub.
    #[arg(short, long)]
    remote: String,

    /// Branch in the local checkout.
    #[arg(short, long)]
    local: String,

    /// GitHub repository as `owner/repo` (overrides `github.repo`).
    #[arg(long)]
    repo: Option<String>,

    /// GitHub API base URL (overrides `github.api_url`).
    #[arg(long)]
    api_url: Option<String>,

    /// Local checkout root (overrides `local.repo_path`).
    #[arg(long)]
    local_path: Option<PathBuf>,

    /// Tree diff implementation: git2 or cli (overrides `local.diff_backend`).
    #[arg(long)]
    diff_backend: Option<DiffBackend>,

    /// Print the report as JSON.
    #[arg(long)]
    json: bool,
}

impl CheckArgs {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(repo) = &self.repo {
            config.github.repo = repo.clone();
        }
        if let Some(api_url) = &self.api_url {
            config.github.api_url = api_url.clone();
        }
        if let Some(path) = &self.local_path {
            config.local.repo_path = path.clone();
        }
        if let Some(backend) = self.diff_backend {
            config.local.diff_backend = backend;
        }
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref());
    let level = config
        .as_ref()
        .map(|c| c.log.level.as_str())
        .unwrap_or(DEFAULT_LOG_LEVEL);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match run(cli, config).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", style::error(&format!("{:#}", e)));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: Result<AppConfig>) -> Result<ExitCode> {
    match cli.command {
        Commands::Init { output, force } => {
            let output = match output {
                Some(path) => path,
                None => default_config_path().context("cannot determine config directory")?,
            };
            cmd_init(&output, force)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Validate => {
            cmd_validate(config?)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Check(args) => cmd_check(config?, &args).await,
    }
}

// ---------------------------------------------------------------------------
// Config helpers
// ---------------------------------------------------------------------------

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("branchconflicts").join("config.toml"))
}

/// An explicit `--config` must exist; the default location is optional.
fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    let mut config = match explicit {
        Some(path) => {
            AppConfig::load_from_file(path).context("failed to load configuration file")?
        }
        None => match default_config_path().filter(|p| p.exists()) {
            Some(path) => {
                AppConfig::load_from_file(&path).context("failed to load configuration file")?
            }
            None => AppConfig::default(),
        },
    };
    config.resolve_env_vars();
    Ok(config)
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

async fn cmd_check(mut config: AppConfig, args: &CheckArgs) -> Result<ExitCode> {
    args.apply(&mut config);
    debug!(
        repo = %config.github.repo,
        local_path = %config.local.repo_path.display(),
        backend = %config.local.diff_backend,
        "effective configuration"
    );

    let engine = ConflictEngine::from_config(&config).context("failed to set up repositories")?;
    let report = engine
        .check(&args.remote, &args.local)
        .await
        .with_context(|| {
            format!(
                "conflict check of '{}' (remote) against '{}' (local) failed",
                args.remote, args.local
            )
        })?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("failed to serialize report")?
        );
    } else {
        print_report(&report);
    }

    Ok(ExitCode::from(exit_status(&report)))
}

fn exit_status(report: &ConflictReport) -> u8 {
    if report.merge_base.is_none() {
        EXIT_NO_MERGE_BASE
    } else if report.has_conflicts() {
        EXIT_CONFLICTS
    } else {
        0
    }
}

fn print_report(report: &ConflictReport) {
    println!();
    println!(
        "{} {} @ {}  ↔  {} {} @ {}",
        style::side("remote"),
        report.remote_branch.name,
        style::short_sha(&report.remote_branch.tip_commit_id),
        style::side("local"),
        report.local_branch.name,
        style::short_sha(&report.local_branch.tip_commit_id),
    );

    let Some(merge_base) = &report.merge_base else {
        println!();
        println!(
            "{}",
            style::warn("No common ancestor found among the recorded parent ids; nothing compared")
        );
        println!();
        return;
    };
    println!(
        "{}",
        style::dim(&format!(
            "merge base {} (estimated) · {} changed remotely · {} changed locally",
            style::short_sha(merge_base),
            report.remote_changes.len(),
            report.local_changes.len()
        ))
    );
    println!();

    if !report.has_conflicts() {
        println!("{}", style::success("No files modified on both sides"));
        println!();
        return;
    }

    println!(
        "{}",
        style::header(&format!("Potential conflicts ({})", report.conflicts.len()))
    );
    println!();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["File"]);
    for path in &report.conflicts {
        table.add_row(vec![Cell::new(path).fg(Color::Red)]);
    }
    println!("{}", table);
    println!();
}

const DEFAULT_CONFIG: &str = r#"# branchconflicts configuration

[github]
api_url = "https://api.github.com"
# Leave empty to infer owner/repo from the URL of local.remote.
repo = "owner/repo"
# Name of the environment variable holding a personal access token.
token_env = "GITHUB_TOKEN"
timeout_secs = 30

[local]
repo_path = "."
remote = "origin"
# "git2" (in-process) or "cli" (runs `git diff`)
diff_backend = "git2"
git_binary = "git"

[log]
level = "warn"
"#;

fn cmd_init(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!(
            "file already exists: {}. Use --force to overwrite it.",
            output.display()
        );
    }
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(output, DEFAULT_CONFIG).context("failed to write config file")?;

    println!("{}", style::success(&format!("Configuration written to {}", output.display())));
    println!();
    println!("Next steps:");
    println!("  1. Set github.repo and local.repo_path");
    println!("  2. Export the token variable named by github.token_env");
    println!("  3. Run: branchconflicts check --remote main --local <branch>");
    Ok(())
}

/// Builds the engine the same way `check` does, so an inferred repository and
/// an unopenable checkout are both caught here.
fn cmd_validate(config: AppConfig) -> Result<()> {
    let engine = ConflictEngine::from_config(&config).context("configuration validation failed")?;

    println!("{}", style::success("Configuration is valid"));
    println!();
    println!("  GitHub API    : {}", config.github.api_url);
    println!("  GitHub repo   : {}", engine.remote().repo());
    println!(
        "  GitHub token  : {}",
        if config.github.token.is_some() {
            "set"
        } else {
            "not set (unauthenticated requests)"
        }
    );
    println!("  Timeout       : {}s", config.github.timeout_secs);
    println!("  Local repo    : {}", config.local.repo_path.display());
    println!("  Diff backend  : {}", config.local.diff_backend);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_check() {
        let cli = Cli::try_parse_from([
            "branchconflicts",
            "check",
            "--remote",
            "main",
            "--local",
            "feature/x",
            "--repo",
            "acme/widgets",
            "--diff-backend",
            "cli",
            "--json",
        ])
        .unwrap();
        let Commands::Check(args) = cli.command else {
            panic!("expected check");
        };
        assert_eq!(args.remote, "main");
        assert_eq!(args.local, "feature/x");
        assert_eq!(args.diff_backend, Some(DiffBackend::Cli));
        assert!(args.json);
    }

    #[test]
    fn test_cli_rejects_unknown_backend() {
        let result = Cli::try_parse_from([
            "branchconflicts",
            "check",
            "-r",
            "main",
            "-l",
            "dev",
            "--diff-backend",
            "svn",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_overrides_apply() {
        let cli = Cli::try_parse_from([
            "branchconflicts",
            "check",
            "-r",
            "main",
            "-l",
            "dev",
            "--repo",
            "acme/widgets",
            "--local-path",
            "/src/widgets",
        ])
        .unwrap();
        let Commands::Check(args) = cli.command else {
            panic!("expected check");
        };
        let mut config = AppConfig::default();
        args.apply(&mut config);
        assert_eq!(config.github.repo, "acme/widgets");
        assert_eq!(config.local.repo_path, PathBuf::from("/src/widgets"));
        assert_eq!(config.local.diff_backend, DiffBackend::Git2);
    }

    #[test]
    fn test_default_config_is_loadable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");
        cmd_init(&path, false).unwrap();
        let config = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(config.github.repo, "owner/repo");
        assert_eq!(config.local.remote, "origin");
        config.validate().unwrap();

        assert!(cmd_init(&path, false).is_err());
        cmd_init(&path, true).unwrap();
    }

    #[test]
    fn test_exit_status_distinguishes_outcomes() {
        use branchconflicts_core::{Branch, ModifiedFileSet};

        let mut report = ConflictReport {
            remote_branch: Branch::new("main", "r1"),
            local_branch: Branch::new("feature", "l1"),
            merge_base: None,
            remote_changes: ModifiedFileSet::new(),
            local_changes: ModifiedFileSet::new(),
            conflicts: ModifiedFileSet::new(),
        };
        assert_eq!(exit_status(&report), EXIT_NO_MERGE_BASE);

        report.merge_base = Some("base".into());
        assert_eq!(exit_status(&report), 0);

        report.conflicts.insert("b.txt".into());
        assert_eq!(exit_status(&report), EXIT_CONFLICTS);
    }

    #[test]
    fn test_explicit_missing_config_fails() {
        assert!(load_config(Some(Path::new("/nonexistent/branchconflicts.toml"))).is_err());
    }
}
