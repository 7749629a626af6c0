//! End-to-end generation: repository selection, change resolution,
//! authorship analysis, prompting, dispatch, and optional commit/push.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::commit::authorship::{FileAuthorship, analyze_change_set, render_authorship};
use crate::commit::changeset::{ChangeSet, resolve_change_set};
use crate::commit::prompt::{GenerationRequest, build_prompt};
use crate::config::Settings;
use crate::error::{CommitError, GitError, ProviderError};
use crate::git::{Git, has_staged_changes, parse_porcelain_status};
use crate::host::Host;
use crate::provider::{CommitMessage, DispatchHooks, Provider, ProviderDispatcher};
use crate::secrets::SecretStore;

/// Choices offered when auto-push is on but auto-commit is off.
pub const PUSH_WITHOUT_COMMIT_CHOICES: [&str; 2] = ["Continue without pushing", "Cancel"];

/// Steps of one generation, in order. `Failed` can follow any step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    ResolvingRepository,
    FetchingChanges,
    AnalyzingAuthorship,
    Generating,
    Retrying { attempt: u32 },
    ApplyingResult,
    AutoCommitting,
    AutoPushing,
    Done,
    Failed,
}

impl Stage {
    pub fn label(&self) -> String {
        match self {
            Stage::Idle => "Idle".to_string(),
            Stage::ResolvingRepository => "Resolving repository".to_string(),
            Stage::FetchingChanges => "Fetching changes".to_string(),
            Stage::AnalyzingAuthorship => "Analyzing authorship".to_string(),
            Stage::Generating => "Generating commit message".to_string(),
            Stage::Retrying { attempt } => format!("Retrying (attempt {attempt})"),
            Stage::ApplyingResult => "Applying commit message".to_string(),
            Stage::AutoCommitting => "Committing changes".to_string(),
            Stage::AutoPushing => "Pushing to remote".to_string(),
            Stage::Done => "Done".to_string(),
            Stage::Failed => "Failed".to_string(),
        }
    }

    /// Share of overall progress, in percent, credited on entering this stage.
    pub fn increment(&self) -> u32 {
        match self {
            Stage::ResolvingRepository => 5,
            Stage::FetchingChanges => 15,
            Stage::AnalyzingAuthorship => 20,
            Stage::Generating => 35,
            Stage::ApplyingResult => 15,
            Stage::AutoCommitting | Stage::AutoPushing => 5,
            Stage::Idle | Stage::Retrying { .. } | Stage::Done | Stage::Failed => 0,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Which repository to work on.
#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    /// Wins over `candidates` when set.
    pub repository: Option<PathBuf>,
    /// Discovered repositories to choose from.
    pub candidates: Vec<PathBuf>,
}

impl GenerateRequest {
    pub fn for_repository(path: impl Into<PathBuf>) -> Self {
        Self {
            repository: Some(path.into()),
            candidates: Vec::new(),
        }
    }

    pub fn from_candidates(candidates: Vec<PathBuf>) -> Self {
        Self {
            repository: None,
            candidates,
        }
    }
}

/// Everything gathered before a backend is called.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub repository: PathBuf,
    pub change_set: ChangeSet,
    pub authorship: Vec<FileAuthorship>,
    pub prompt: String,
}

/// Result of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    pub repository: PathBuf,
    pub message: CommitMessage,
    pub committed: bool,
    pub pushed: bool,
    pub warnings: Vec<String>,
}

/// Runs generations against injected collaborators.
pub struct Orchestrator<'a> {
    git: &'a Git,
    dispatcher: &'a ProviderDispatcher,
    host: &'a dyn Host,
    secrets: &'a dyn SecretStore,
    settings: &'a Settings,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        git: &'a Git,
        dispatcher: &'a ProviderDispatcher,
        host: &'a dyn Host,
        secrets: &'a dyn SecretStore,
        settings: &'a Settings,
    ) -> Self {
        Self {
            git,
            dispatcher,
            host,
            secrets,
            settings,
        }
    }

    /// Generate a message, apply it to the host input, then commit and push
    /// as configured.
    pub async fn run(&self, request: &GenerateRequest) -> Result<Outcome, CommitError> {
        let result = self.execute(request).await;
        match &result {
            Ok(outcome) => info!(
                "Generated message for {} (committed={}, pushed={})",
                outcome.repository.display(),
                outcome.committed,
                outcome.pushed
            ),
            Err(e) => {
                debug!("Generation failed: {:?}", e);
                self.enter(Stage::Failed);
            }
        }
        result
    }

    /// Build the prompt without calling a backend.
    pub async fn preview_prompt(&self, request: &GenerateRequest) -> Result<Prepared, CommitError> {
        self.enter(Stage::ResolvingRepository);
        let repository = self.select_repository(request)?;
        self.prepare(&repository).await
    }

    async fn execute(&self, request: &GenerateRequest) -> Result<Outcome, CommitError> {
        let mut warnings = Vec::new();
        let push_enabled = self.check_push_policy(&mut warnings)?;

        self.enter(Stage::ResolvingRepository);
        let repository = self.select_repository(request)?;
        let prepared = self.prepare(&repository).await?;

        self.enter(Stage::Generating);
        let provider = self.settings.provider;
        let config = self.settings.provider_config(self.secrets.get(provider));
        let hooks = HostHooks {
            host: self.host,
            secrets: self.secrets,
        };
        let message = self
            .dispatcher
            .generate(&prepared.prompt, &config, &hooks)
            .await?;

        self.enter(Stage::ApplyingResult);
        self.host.set_input(&message.text);

        let mut committed = false;
        let mut pushed = false;
        if self.settings.auto_commit {
            self.enter(Stage::AutoCommitting);
            self.auto_commit(&repository).await?;
            committed = true;

            if push_enabled {
                self.enter(Stage::AutoPushing);
                pushed = self.auto_push(&repository, &mut warnings).await?;
            }
        }

        self.enter(Stage::Done);
        Ok(Outcome {
            repository,
            message,
            committed,
            pushed,
            warnings,
        })
    }

    /// Auto-push without auto-commit has nothing to push. Ask before doing
    /// any work; returns whether pushing stays enabled.
    fn check_push_policy(&self, warnings: &mut Vec<String>) -> Result<bool, CommitError> {
        if !self.settings.auto_push {
            return Ok(false);
        }
        if self.settings.auto_commit {
            return Ok(true);
        }

        let message = "Auto-push is enabled but auto-commit is disabled, so there is nothing to push.";
        match self.host.warn(message, &PUSH_WITHOUT_COMMIT_CHOICES) {
            Some(0) => {
                warnings.push(message.to_string());
                Ok(false)
            }
            _ => Err(CommitError::AutoPushRequiresAutoCommit),
        }
    }

    fn select_repository(&self, request: &GenerateRequest) -> Result<PathBuf, CommitError> {
        if let Some(repo) = &request.repository {
            return Ok(repo.clone());
        }

        match request.candidates.as_slice() {
            [] => Err(CommitError::NoRepositoriesFound),
            [only] => Ok(only.clone()),
            many => {
                let items: Vec<String> = many.iter().map(|p| p.display().to_string()).collect();
                self.host
                    .pick("Select a repository", &items)
                    .and_then(|i| many.get(i).cloned())
                    .ok_or(CommitError::NoRepositorySelected)
            }
        }
    }

    async fn prepare(&self, repository: &Path) -> Result<Prepared, CommitError> {
        self.enter(Stage::FetchingChanges);
        let change_set = resolve_change_set(self.git, repository, self.settings.scope)
            .await
            .map_err(unavailable_git)?;
        debug!(
            "{} file(s) changed in {}, {} byte diff{}",
            change_set.files.len(),
            change_set.source,
            change_set.diff_text.len(),
            if change_set.truncated { " (truncated)" } else { "" }
        );

        self.enter(Stage::AnalyzingAuthorship);
        let authorship = analyze_change_set(self.git, repository, &change_set).await;

        let prompt = build_prompt(&GenerationRequest {
            diff_text: change_set.diff_text.clone(),
            authorship_text: render_authorship(&authorship),
            format: self.settings.format.clone(),
            language: self.settings.language.clone(),
            custom_instructions: self.settings.custom_instructions.clone(),
        });

        Ok(Prepared {
            repository: repository.to_path_buf(),
            change_set,
            authorship,
            prompt,
        })
    }

    /// Commit with whatever the input surface holds now. Staged changes are
    /// committed alone; with nothing staged, everything is staged first.
    async fn auto_commit(&self, repository: &Path) -> Result<(), CommitError> {
        let message = self.host.input();
        let status = self
            .git
            .status_porcelain(repository)
            .await
            .map_err(CommitError::AutoCommitFailed)?;

        if !has_staged_changes(&parse_porcelain_status(&status)) {
            debug!("Nothing staged, staging all changes");
            self.git
                .add_all(repository)
                .await
                .map_err(CommitError::AutoCommitFailed)?;
        }

        self.git
            .commit(repository, message.trim())
            .await
            .map_err(CommitError::AutoCommitFailed)
    }

    /// Returns whether a push happened. A repository without remotes is a
    /// warning, not a failure.
    async fn auto_push(&self, repository: &Path, warnings: &mut Vec<String>) -> Result<bool, CommitError> {
        let remotes = self
            .git
            .remotes(repository)
            .await
            .map_err(CommitError::AutoPushFailed)?;

        if remotes.is_empty() {
            let message = "No remote configured, skipping push.";
            warn!("{} has no remotes", repository.display());
            self.host.warn(message, &[]);
            warnings.push(message.to_string());
            return Ok(false);
        }

        self.git
            .push(repository)
            .await
            .map_err(CommitError::AutoPushFailed)?;
        Ok(true)
    }

    fn enter(&self, stage: Stage) {
        debug!("Stage: {}", stage);
        self.host.report_progress(&stage.label(), stage.increment());
    }
}

fn unavailable_git(err: CommitError) -> CommitError {
    match err {
        CommitError::Git(e @ (GitError::NotInstalled | GitError::SpawnFailed(_))) => {
            CommitError::VersionControlUnavailable(e.to_string())
        }
        other => other,
    }
}

/// Routes dispatcher callbacks to the host and secret store.
struct HostHooks<'a> {
    host: &'a dyn Host,
    secrets: &'a dyn SecretStore,
}

#[async_trait]
impl<'a> DispatchHooks for HostHooks<'a> {
    fn on_retry(&self, next_attempt: u32, _max_attempts: u32, _error: &ProviderError, _delay: Duration) {
        let stage = Stage::Retrying {
            attempt: next_attempt,
        };
        self.host.report_progress(&stage.label(), stage.increment());
    }

    async fn request_credential(&self, provider: Provider) -> Option<String> {
        let key = self
            .host
            .prompt_secret(&format!("Enter your {provider} API key"))?;
        self.secrets.set(provider, key.clone());
        Some(key)
    }
}
