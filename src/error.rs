//! Error types for scrivener modules using thiserror.

use thiserror::Error;

use crate::provider::Provider;

/// Errors from git subprocess operations.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("git executable not found. Install git and make sure it is on PATH")]
    NotInstalled,

    #[error("Failed to spawn git process: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("git {args} exited with code {code}{}", stderr_suffix(.stderr))]
    CommandFailed {
        args: String,
        code: i32,
        stderr: String,
    },

    #[error("Failed to read {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl GitError {
    /// Captured standard error of a failed command, if any.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            GitError::CommandFailed { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

/// Errors from text-generation backends.
///
/// Each variant maps to one row of the HTTP status classification; see
/// [`ProviderError::is_retryable`].
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("{provider} rejected the API key (HTTP {status}). Check the key configured for {provider}.")]
    AuthenticationRejected { provider: Provider, status: u16 },

    #[error("{provider} requires payment or billing setup (HTTP 402). Check your account billing and quota.")]
    QuotaOrBilling { provider: Provider },

    #[error("{provider} rejected the request as malformed (HTTP 422), the diff may be too large: {detail}")]
    InvalidRequest { provider: Provider, detail: String },

    #[error("{provider} rate limit reached (HTTP 429)")]
    RateLimited { provider: Provider },

    #[error("{provider} server error (HTTP {status})")]
    ServerError { provider: Provider, status: u16 },

    #[error("{provider} returned HTTP {status}: {detail}")]
    ClientError {
        provider: Provider,
        status: u16,
        detail: String,
    },

    #[error("Could not reach {provider}: {detail}")]
    TransportFailure { provider: Provider, detail: String },

    #[error("{provider} returned an empty commit message")]
    EmptyGeneratedMessage { provider: Provider },

    #[error("{provider} returned an empty or malformed response: {detail}")]
    MalformedResponse { provider: Provider, detail: String },

    #[error("No API key configured for {0}. Set {env} or add it when prompted.", env = .0.api_key_env())]
    MissingApiKey(Provider),

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

impl ProviderError {
    /// Whether another attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimited { .. }
                | ProviderError::ServerError { .. }
                | ProviderError::TransportFailure { .. }
                | ProviderError::EmptyGeneratedMessage { .. }
                | ProviderError::MalformedResponse { .. }
        )
    }

    /// HTTP 401 specifically, the only status eligible for credential re-entry.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            ProviderError::AuthenticationRejected { status: 401, .. }
        )
    }
}

/// Errors from commit message generation operations.
#[derive(Error, Debug)]
pub enum CommitError {
    #[error("No changes detected to generate a commit message from")]
    NoChanges,

    #[error("No git repositories found")]
    NoRepositoriesFound,

    #[error("No repository selected")]
    NoRepositorySelected,

    #[error("Version control unavailable: {0}")]
    VersionControlUnavailable(String),

    #[error("Auto-push requires auto-commit to be enabled")]
    AutoPushRequiresAutoCommit,

    #[error("Commit message was generated but the auto-commit failed: {0}")]
    AutoCommitFailed(#[source] GitError),

    #[error("Commit created but the auto-push failed: {0}")]
    AutoPushFailed(#[source] GitError),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Generation(#[from] ProviderError),
}

/// Errors from configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ParseFailed {
        path: String,
        #[source]
        source: toml_edit::TomlError,
    },

    #[error("Invalid value '{value}' for setting '{key}': expected {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },
}
