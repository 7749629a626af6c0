//! scrivener - CLI entry point.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use scrivener::git::{discover_repositories, repository_root};
use scrivener::{
    EnvSecretStore, GenerateRequest, Git, LayeredConfig, Orchestrator, Provider,
    ProviderDispatcher, ScopePolicy, Settings, TerminalHost,
};

/// Environment variable holding the log filter.
const LOG_ENV: &str = "SCRIVENER_LOG";

/// Draft a commit message from pending changes using an LLM backend.
#[derive(Parser, Debug)]
#[command(name = "scrivener")]
#[command(about = "Draft a commit message from pending changes using an LLM backend")]
#[command(version)]
struct Cli {
    /// Repository to use; repeat to choose between several
    #[arg(long = "repo", value_name = "PATH")]
    repos: Vec<PathBuf>,

    /// Only describe staged changes
    #[arg(long)]
    staged_only: bool,

    /// Message format: conventional, angular, karma, semantic, emoji
    #[arg(long)]
    format: Option<String>,

    /// Message language, e.g. en, zh-cn, ja
    #[arg(long)]
    language: Option<String>,

    /// Backend: gemini, openai, codestral, ollama
    #[arg(long)]
    provider: Option<String>,

    /// Model name for the selected backend
    #[arg(long)]
    model: Option<String>,

    /// Replace the format rules with your own instructions
    #[arg(long)]
    custom_instructions: Option<String>,

    /// Commit the generated message
    #[arg(long)]
    auto_commit: bool,

    /// Push after committing (requires --auto-commit)
    #[arg(long)]
    auto_push: bool,

    /// Print the prompt without calling a backend
    #[arg(long)]
    dry_run: bool,

    /// Print the outcome as JSON instead of plain text
    #[arg(long)]
    json: bool,

    /// Verbose logging to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            debug!("{:?}", e);
            eprintln!("Error: {}", render_error(&e));
            ExitCode::FAILURE
        }
    }
}

/// One line for the whole error chain. Causes already spelled out by an
/// outer message are not repeated.
fn render_error(err: &anyhow::Error) -> String {
    let mut rendered = String::new();
    for cause in err.chain() {
        let text = cause.to_string();
        if text.is_empty() || rendered.contains(&text) {
            continue;
        }
        if !rendered.is_empty() {
            rendered.push_str(": ");
        }
        rendered.push_str(&text);
    }
    rendered
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "scrivener=debug" } else { "warn" };
    let filter = env::var(LOG_ENV)
        .ok()
        .and_then(|f| EnvFilter::try_new(f).ok())
        .unwrap_or_else(|| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    // Step 1: Resolve settings (defaults, config file, environment, flags)
    let config = LayeredConfig::load().context("Failed to load configuration")?;
    let mut settings = Settings::resolve(&config).context("Invalid configuration")?;
    apply_flags(&cli, &mut settings)?;

    // Step 2: Check prerequisites
    let git = Git::system().context("git is required")?;
    let dispatcher = ProviderDispatcher::new().context("Failed to initialize HTTP client")?;
    let secrets = EnvSecretStore::new();
    let host = TerminalHost::new(!cli.verbose && cli.dry_run);

    // Step 3: Pick candidate repositories
    let request = repository_request(cli.repos)?;
    let orchestrator = Orchestrator::new(&git, &dispatcher, &host, &secrets, &settings);

    if cli.dry_run {
        let prepared = orchestrator.preview_prompt(&request).await?;
        eprintln!(
            "Describing {} in {} ({} file(s))",
            prepared.change_set.source,
            prepared.repository.display(),
            prepared.change_set.files.len()
        );
        println!("{}", prepared.prompt);
        return Ok(());
    }

    // Step 4: Generate, apply, and optionally commit/push
    let outcome = orchestrator.run(&request).await?;

    if cli.json {
        let rendered = serde_json::to_string_pretty(&outcome).context("Failed to serialize outcome")?;
        println!("{rendered}");
        return Ok(());
    }

    for warning in &outcome.warnings {
        eprintln!("Warning: {warning}");
    }
    println!("{}", outcome.message.text);
    if outcome.committed {
        eprintln!("Committed in {}", outcome.repository.display());
    }
    if outcome.pushed {
        eprintln!("Pushed to remote");
    }

    Ok(())
}

fn apply_flags(cli: &Cli, settings: &mut Settings) -> Result<()> {
    if let Some(name) = &cli.provider {
        settings.provider = Provider::parse(name).ok_or_else(|| {
            anyhow!("Unknown provider '{name}'. Expected one of gemini, openai, codestral, ollama")
        })?;
    }
    if let Some(model) = &cli.model {
        settings.set_model(settings.provider, model.clone());
    }
    if let Some(format) = &cli.format {
        settings.format = format.clone();
    }
    if let Some(language) = &cli.language {
        settings.language = language.clone();
    }
    if let Some(custom) = &cli.custom_instructions {
        settings.custom_instructions = Some(custom.clone());
    }
    if cli.staged_only {
        settings.scope = ScopePolicy::StagedOnly;
    }
    if cli.auto_commit {
        settings.auto_commit = true;
    }
    if cli.auto_push {
        settings.auto_push = true;
    }
    Ok(())
}

fn repository_request(mut repos: Vec<PathBuf>) -> Result<GenerateRequest> {
    match repos.len() {
        0 => {
            let cwd = env::current_dir().context("Failed to read current directory")?;
            let candidates = discover_repositories(&cwd);
            debug!("Discovered {} repositories under {}", candidates.len(), cwd.display());
            Ok(GenerateRequest::from_candidates(candidates))
        }
        1 => Ok(GenerateRequest::for_repository(to_repository_root(repos.remove(0)))),
        _ => Ok(GenerateRequest::from_candidates(
            repos.into_iter().map(to_repository_root).collect(),
        )),
    }
}

/// `--repo` may name any directory inside a repository.
fn to_repository_root(path: PathBuf) -> PathBuf {
    repository_root(&path).unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrivener::{CommitError, GitError};

    fn commit_failure(stderr: &str) -> anyhow::Error {
        CommitError::AutoCommitFailed(GitError::CommandFailed {
            args: "commit -m fix: update a".to_string(),
            code: 1,
            stderr: stderr.to_string(),
        })
        .into()
    }

    #[test]
    fn test_render_error_does_not_repeat_source() {
        assert_eq!(
            render_error(&commit_failure("")),
            "Commit message was generated but the auto-commit failed: git commit -m fix: update a exited with code 1"
        );
        assert_eq!(
            render_error(&commit_failure("hook rejected")),
            "Commit message was generated but the auto-commit failed: git commit -m fix: update a exited with code 1: hook rejected"
        );
    }

    #[test]
    fn test_render_error_keeps_context() {
        let err = anyhow::Error::new(std::io::Error::other("disk full")).context("Failed to load configuration");
        assert_eq!(render_error(&err), "Failed to load configuration: disk full");
    }
}
