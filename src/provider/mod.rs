//! Text-generation backends and the dispatcher that drives them.

pub mod backend;
pub mod cleanup;
pub mod codestral;
pub mod dispatcher;
pub mod gemini;
pub mod ollama;
pub mod openai;
pub mod retry;

use std::fmt;
use std::time::Duration;

use serde::Serialize;

pub use backend::Backend;
pub use cleanup::clean_message;
pub use dispatcher::{DispatchHooks, NoHooks, ProviderDispatcher};
pub use retry::RetryPolicy;

/// Per-attempt HTTP timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Supported text-generation providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Gemini,
    OpenAi,
    Codestral,
    Ollama,
}

impl Provider {
    pub const ALL: [Provider; 4] = [
        Provider::Gemini,
        Provider::OpenAi,
        Provider::Codestral,
        Provider::Ollama,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Gemini => "Gemini",
            Provider::OpenAi => "OpenAI",
            Provider::Codestral => "Codestral",
            Provider::Ollama => "Ollama",
        }
    }

    /// Lowercase identifier used in configuration keys.
    pub fn key(&self) -> &'static str {
        match self {
            Provider::Gemini => "gemini",
            Provider::OpenAi => "openai",
            Provider::Codestral => "codestral",
            Provider::Ollama => "ollama",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL.into_iter().find(|p| {
            p.key().eq_ignore_ascii_case(value) || p.as_str().eq_ignore_ascii_case(value)
        })
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Gemini => "gemini-2.0-flash",
            Provider::OpenAi => "gpt-4o-mini",
            Provider::Codestral => "codestral-latest",
            Provider::Ollama => "llama3.2",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Provider::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            Provider::OpenAi => "https://api.openai.com/v1",
            Provider::Codestral => "https://codestral.mistral.ai/v1",
            Provider::Ollama => "http://localhost:11434",
        }
    }

    /// Primary environment variable holding the API key.
    pub fn api_key_env(&self) -> &'static str {
        self.api_key_env_vars()[0]
    }

    /// Environment variables checked for the API key, in order.
    pub fn api_key_env_vars(&self) -> &'static [&'static str] {
        match self {
            Provider::Gemini => &["GEMINI_API_KEY"],
            Provider::OpenAi => &["OPENAI_API_KEY"],
            Provider::Codestral => &["CODESTRAL_API_KEY", "MISTRAL_API_KEY"],
            Provider::Ollama => &["OLLAMA_API_KEY"],
        }
    }

    /// Local Ollama servers accept unauthenticated requests.
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, Provider::Ollama)
    }

    /// Whether a 401 triggers one credential re-entry before failing.
    pub fn reprompts_on_unauthorized(&self) -> bool {
        matches!(self, Provider::Gemini)
    }

    /// Largest prompt, in bytes, sent to this provider.
    pub fn max_prompt_chars(&self) -> usize {
        match self {
            Provider::Gemini => 120_000,
            Provider::OpenAi | Provider::Codestral => 100_000,
            Provider::Ollama => 24_000,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cleaned, non-empty generated message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitMessage {
    pub text: String,
    pub model: String,
}

/// Fully resolved settings for one generation.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub provider: Provider,
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub retry: RetryPolicy,
    pub timeout: Duration,
    pub max_prompt_chars: usize,
}

impl ProviderConfig {
    /// Provider defaults with no API key.
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            api_key: None,
            model: provider.default_model().to_string(),
            base_url: provider.default_base_url().to_string(),
            retry: RetryPolicy::default(),
            timeout: REQUEST_TIMEOUT,
            max_prompt_chars: provider.max_prompt_chars(),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}
