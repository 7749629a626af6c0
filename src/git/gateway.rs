//! Git subprocess gateway.
//!
//! All operations shell out to the system `git` binary, inheriting the user's
//! existing git config, SSH agent, and credential store.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::GitError;

/// Exit code git uses for fatal errors such as "no HEAD yet".
const SOFT_EMPTY_EXIT_CODE: i32 = 128;

/// Config applied to every invocation so output is stable for parsing.
const BASE_ARGS: [&str; 4] = ["-c", "core.quotepath=off", "-c", "color.ui=false"];

/// Captured result of one git invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl GitOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Trait for executing git commands.
///
/// This abstraction allows mocking the git subprocess in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GitExecutor: Send + Sync {
    /// Run git with `args` inside `repo` and capture its output.
    async fn exec(&self, repo: &Path, args: &[String]) -> Result<GitOutput, GitError>;
}

/// Executor that calls the real git binary.
pub struct GitCli {
    binary: PathBuf,
}

impl GitCli {
    /// Locate git on PATH.
    ///
    /// Uses the `which` crate for cross-platform executable detection.
    pub fn locate() -> Result<Self, GitError> {
        let binary = which::which("git").map_err(|_| GitError::NotInstalled)?;
        Ok(Self { binary })
    }
}

#[async_trait]
impl GitExecutor for GitCli {
    async fn exec(&self, repo: &Path, args: &[String]) -> Result<GitOutput, GitError> {
        let output = Command::new(&self.binary)
            .args(BASE_ARGS)
            .args(args)
            .current_dir(repo)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(GitError::SpawnFailed)?;

        Ok(GitOutput {
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Diff, status, and blame primitives on top of a [`GitExecutor`].
#[derive(Clone)]
pub struct Git {
    executor: Arc<dyn GitExecutor>,
}

impl Git {
    pub fn new(executor: Arc<dyn GitExecutor>) -> Self {
        Self { executor }
    }

    /// Gateway backed by the system git binary.
    pub fn system() -> Result<Self, GitError> {
        Ok(Self::new(Arc::new(GitCli::locate()?)))
    }

    /// Run a git command; any non-zero exit is an error.
    pub async fn run(&self, repo: &Path, args: &[&str]) -> Result<String, GitError> {
        let output = self.exec(repo, args).await?;
        if !output.success() {
            return Err(command_failed(args, output));
        }
        Ok(output.stdout)
    }

    /// Run a git command, treating exit code 128 as a soft-empty result.
    pub async fn run_soft(&self, repo: &Path, args: &[&str]) -> Result<Option<String>, GitError> {
        let output = self.exec(repo, args).await?;
        match output.code {
            0 => Ok(Some(output.stdout)),
            SOFT_EMPTY_EXIT_CODE => {
                debug!("git {} soft-failed: {}", args.join(" "), output.stderr.trim());
                Ok(None)
            }
            _ => Err(command_failed(args, output)),
        }
    }

    async fn exec(&self, repo: &Path, args: &[&str]) -> Result<GitOutput, GitError> {
        debug!("git {} (in {})", args.join(" "), repo.display());
        let owned: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        self.executor.exec(repo, &owned).await
    }

    /// Whether the repository has at least one commit.
    pub async fn has_head(&self, repo: &Path) -> Result<bool, GitError> {
        Ok(self
            .run_soft(repo, &["rev-parse", "--verify", "HEAD"])
            .await?
            .is_some())
    }

    pub async fn staged_diff(&self, repo: &Path) -> Result<String, GitError> {
        self.run(repo, &["diff", "--staged", "--no-ext-diff"]).await
    }

    pub async fn staged_name_status(&self, repo: &Path) -> Result<String, GitError> {
        self.run(repo, &["diff", "--staged", "--name-status", "-M"])
            .await
    }

    /// Unstaged changes to tracked files, deletions excluded.
    pub async fn unstaged_diff(&self, repo: &Path) -> Result<String, GitError> {
        self.run(repo, &["diff", "--no-ext-diff", "--diff-filter=d"])
            .await
    }

    pub async fn unstaged_name_status(&self, repo: &Path) -> Result<String, GitError> {
        self.run(repo, &["diff", "--name-status", "--diff-filter=d"])
            .await
    }

    pub async fn untracked_files(&self, repo: &Path) -> Result<Vec<String>, GitError> {
        let out = self
            .run(repo, &["ls-files", "--others", "--exclude-standard"])
            .await?;
        Ok(non_empty_lines(&out))
    }

    pub async fn deleted_files(&self, repo: &Path) -> Result<Vec<String>, GitError> {
        let out = self.run(repo, &["ls-files", "--deleted"]).await?;
        Ok(non_empty_lines(&out))
    }

    /// Content of `path` at HEAD, or `None` when there is no HEAD or no such file.
    pub async fn file_at_head(&self, repo: &Path, path: &str) -> Result<Option<String>, GitError> {
        let spec = format!("HEAD:{path}");
        self.run_soft(repo, &["show", &spec]).await
    }

    /// Content of `path` as recorded in the index.
    pub async fn file_in_index(&self, repo: &Path, path: &str) -> Result<Option<String>, GitError> {
        let spec = format!(":{path}");
        self.run_soft(repo, &["show", &spec]).await
    }

    /// Combined staged + unstaged diff of one file against HEAD.
    pub async fn diff_against_head(&self, repo: &Path, path: &str) -> Result<String, GitError> {
        self.run(repo, &["diff", "--no-ext-diff", "HEAD", "--", path])
            .await
    }

    /// Diff of a renamed file against HEAD with rename detection, so an
    /// unedited move has no hunks.
    pub async fn diff_rename_against_head(
        &self,
        repo: &Path,
        old_path: &str,
        new_path: &str,
    ) -> Result<String, GitError> {
        self.run(
            repo,
            &["diff", "--no-ext-diff", "-M", "HEAD", "--", old_path, new_path],
        )
        .await
    }

    /// Blame of the committed version of `path`.
    pub async fn blame_head(&self, repo: &Path, path: &str) -> Result<String, GitError> {
        self.run(repo, &["blame", "--line-porcelain", "HEAD", "--", path])
            .await
    }

    pub async fn status_porcelain(&self, repo: &Path) -> Result<String, GitError> {
        self.run(repo, &["status", "--porcelain"]).await
    }

    pub async fn add_all(&self, repo: &Path) -> Result<(), GitError> {
        self.run(repo, &["add", "-A"]).await.map(|_| ())
    }

    pub async fn commit(&self, repo: &Path, message: &str) -> Result<(), GitError> {
        self.run(repo, &["commit", "-m", message]).await.map(|_| ())
    }

    pub async fn push(&self, repo: &Path) -> Result<(), GitError> {
        self.run(repo, &["push"]).await.map(|_| ())
    }

    pub async fn remotes(&self, repo: &Path) -> Result<Vec<String>, GitError> {
        let out = self.run(repo, &["remote"]).await?;
        Ok(non_empty_lines(&out))
    }
}

fn command_failed(args: &[&str], output: GitOutput) -> GitError {
    GitError::CommandFailed {
        args: args.join(" "),
        code: output.code,
        stderr: output.stderr.trim().to_string(),
    }
}

fn non_empty_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim_end)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}
