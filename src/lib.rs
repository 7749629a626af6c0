//! scrivener - A CLI tool that drafts commit messages from pending changes.
//!
//! # Overview
//!
//! scrivener collects the pending diff of a git repository, attributes the
//! changed lines to their previous authors with `git blame`, renders a prompt
//! from a format/language template and asks one of several text-generation
//! backends (Gemini, OpenAI, Codestral, Ollama) for a commit message. The
//! message can optionally be committed and pushed.

pub mod commit;
pub mod config;
pub mod error;
pub mod git;
pub mod host;
pub mod provider;
pub mod secrets;

// Re-export commonly used types
pub use commit::{ChangeSet, GenerateRequest, Orchestrator, Outcome, ScopePolicy, Stage};
pub use config::{ConfigSource, LayeredConfig, Settings};
pub use error::{CommitError, ConfigError, GitError, ProviderError};
pub use git::Git;
pub use host::{Host, TerminalHost};
pub use provider::{CommitMessage, Provider, ProviderConfig, ProviderDispatcher, RetryPolicy};
pub use secrets::{EnvSecretStore, SecretStore};
