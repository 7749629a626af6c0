//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Mutex;
use std::time::Duration;

use scrivener::{Host, LayeredConfig, Provider, RetryPolicy, SecretStore, Settings};

/// A temporary git repository driven through the git CLI.
pub struct TestRepo {
    pub dir: tempfile::TempDir,
}

impl TestRepo {
    /// Create a new empty git repository with a local identity configured.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let repo = Self { dir };
        repo.git(&["init", "-q"]);
        repo.git(&["config", "user.name", "Test User"]);
        repo.git(&["config", "user.email", "test@example.com"]);
        repo.git(&["config", "commit.gpgsign", "false"]);
        repo
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Run git in the repository, panicking on failure. Returns stdout.
    pub fn git(&self, args: &[&str]) -> String {
        let output = Command::new("git")
            .args(args)
            .current_dir(self.dir.path())
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()
            .expect("Failed to run git");
        assert!(
            output.status.success(),
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).into_owned()
    }

    pub fn write(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    pub fn remove(&self, name: &str) {
        std::fs::remove_file(self.dir.path().join(name)).expect("Failed to remove file");
    }

    pub fn stage(&self, name: &str) {
        self.git(&["add", "--", name]);
    }

    /// Stage everything and commit as `author`.
    pub fn commit_all_as(&self, author: &str, message: &str) {
        self.git(&["add", "-A"]);
        let author_arg = format!("{} <{}@example.com>", author, author.to_lowercase());
        self.git(&["commit", "-q", "--author", &author_arg, "-m", message]);
    }

    /// Write a file and commit it as `author`.
    pub fn commit_file_as(&self, author: &str, name: &str, content: &str) {
        self.write(name, content);
        self.commit_all_as(author, &format!("update {name}"));
    }

    pub fn head_subject(&self) -> String {
        self.git(&["log", "-1", "--format=%s"]).trim().to_string()
    }

    pub fn files_in_head_commit(&self) -> Vec<String> {
        self.git(&["show", "--name-only", "--format=", "HEAD"])
            .lines()
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn status(&self) -> String {
        self.git(&["status", "--porcelain"])
    }

    /// Attach a bare repository as `origin` and push the current branch to it.
    pub fn add_bare_remote(&self) -> tempfile::TempDir {
        let bare = tempfile::tempdir().expect("Failed to create temp directory");
        let status = Command::new("git")
            .args(["init", "-q", "--bare"])
            .current_dir(bare.path())
            .status()
            .expect("Failed to run git");
        assert!(status.success());
        let url = bare.path().display().to_string();
        self.git(&["remote", "add", "origin", &url]);
        self.git(&["push", "-q", "-u", "origin", "HEAD"]);
        bare
    }
}

/// Subject of the latest commit in a bare repository.
pub fn bare_head_subject(bare: &Path) -> String {
    let output = Command::new("git")
        .args(["log", "-1", "--format=%s"])
        .current_dir(bare)
        .output()
        .expect("Failed to run git");
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Retry policy with millisecond delays for HTTP tests.
pub fn fast_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_delay: Duration::from_millis(5),
        max_backoff: Duration::from_millis(20),
    }
}

/// Settings for `provider` pointed at `base_url`, plus any extra pairs.
pub fn settings_for(provider: Provider, base_url: &str, extra: &[(&str, &str)]) -> Settings {
    let mut pairs: Vec<(String, String)> = vec![
        ("provider".to_string(), provider.key().to_string()),
        ("max_retries".to_string(), "3".to_string()),
        ("initial_backoff_ms".to_string(), "5".to_string()),
        ("max_backoff_ms".to_string(), "20".to_string()),
    ];
    pairs.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));
    let mut settings = Settings::resolve(&LayeredConfig::from_pairs(pairs)).expect("valid settings");
    settings.set_base_url(provider, base_url);
    settings
}

/// OpenAI-style completion body.
pub fn chat_response(content: &str) -> serde_json::Value {
    serde_json::json!({
        "choices": [{"message": {"role": "assistant", "content": content}}]
    })
}

/// Everything a [`RecordingHost`] saw, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    Progress(String, u32),
    Warn(String),
    Pick(Vec<String>),
    SecretPrompt(String),
    SetInput(String),
}

/// Host double that records interactions and answers from fixed choices.
#[derive(Default)]
pub struct RecordingHost {
    pub events: Mutex<Vec<HostEvent>>,
    pub input: Mutex<String>,
    pub warn_choice: Option<usize>,
    pub pick_choice: Option<usize>,
    pub secret: Option<String>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<HostEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn progress_labels(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                HostEvent::Progress(label, _) => Some(label),
                _ => None,
            })
            .collect()
    }

    pub fn total_progress(&self) -> u32 {
        self.events()
            .into_iter()
            .map(|e| match e {
                HostEvent::Progress(_, n) => n,
                _ => 0,
            })
            .sum()
    }

    fn record(&self, event: HostEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl Host for RecordingHost {
    fn set_input(&self, text: &str) {
        self.record(HostEvent::SetInput(text.to_string()));
        *self.input.lock().unwrap() = text.to_string();
    }

    fn input(&self) -> String {
        self.input.lock().unwrap().clone()
    }

    fn report_progress(&self, message: &str, increment: u32) {
        self.record(HostEvent::Progress(message.to_string(), increment));
    }

    fn pick(&self, _title: &str, items: &[String]) -> Option<usize> {
        self.record(HostEvent::Pick(items.to_vec()));
        self.pick_choice
    }

    fn warn(&self, message: &str, _choices: &[&str]) -> Option<usize> {
        self.record(HostEvent::Warn(message.to_string()));
        self.warn_choice
    }

    fn prompt_secret(&self, prompt: &str) -> Option<String> {
        self.record(HostEvent::SecretPrompt(prompt.to_string()));
        self.secret.clone()
    }
}

/// In-memory secret store that never touches the environment.
#[derive(Default)]
pub struct MemorySecrets {
    keys: Mutex<HashMap<Provider, String>>,
}

impl MemorySecrets {
    pub fn with(provider: Provider, key: &str) -> Self {
        let store = Self::default();
        store.set(provider, key.to_string());
        store
    }
}

impl SecretStore for MemorySecrets {
    fn get(&self, provider: Provider) -> Option<String> {
        self.keys.lock().unwrap().get(&provider).cloned()
    }

    fn set(&self, provider: Provider, key: String) {
        self.keys.lock().unwrap().insert(provider, key);
    }

    fn delete(&self, provider: Provider) {
        self.keys.lock().unwrap().remove(&provider);
    }
}

/// Canonical form of a repository path, as discovery reports it.
pub fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
