//! Drives one generation: prompt fitting, backend attempts, retry with
//! backoff, credential re-entry and response cleanup.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use backoff::backoff::Backoff;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::commit::changeset::{TRUNCATION_MARKER, truncate_with_marker};
use crate::commit::prompt::RESPONSE_INSTRUCTION;
use crate::error::ProviderError;
use crate::provider::backend::Backend;
use crate::provider::cleanup::clean_message;
use crate::provider::{CommitMessage, Provider, ProviderConfig, REQUEST_TIMEOUT};

/// Callbacks into the caller during a generation.
#[async_trait]
pub trait DispatchHooks: Send + Sync {
    /// Called before sleeping ahead of attempt `next_attempt`.
    fn on_retry(&self, _next_attempt: u32, _max_attempts: u32, _error: &ProviderError, _delay: Duration) {}

    /// Ask for a (new) API key. `None` means the user declined.
    async fn request_credential(&self, _provider: Provider) -> Option<String> {
        None
    }
}

/// Hooks that do nothing and never supply credentials.
pub struct NoHooks;

impl DispatchHooks for NoHooks {}

/// Sends prompts to whichever backend a [`ProviderConfig`] names.
#[derive(Debug, Clone)]
pub struct ProviderDispatcher {
    client: Client,
}

impl ProviderDispatcher {
    pub fn new() -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ProviderError::ClientBuild)?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Generate a commit message for `prompt`.
    ///
    /// Returns a cleaned, non-empty message or the last classified error.
    pub async fn generate(
        &self,
        prompt: &str,
        config: &ProviderConfig,
        hooks: &dyn DispatchHooks,
    ) -> Result<CommitMessage, ProviderError> {
        let mut config = config.clone();
        if config.provider.requires_api_key() && !has_key(&config) {
            match hooks.request_credential(config.provider).await {
                Some(key) => config.api_key = Some(key),
                None => return Err(ProviderError::MissingApiKey(config.provider)),
            }
        }

        let prompt = fit_prompt(prompt, config.max_prompt_chars);
        debug!(
            "Dispatching {} byte prompt to {} ({})",
            prompt.len(),
            config.provider,
            config.model
        );

        let client = &self.client;
        let prompt = prompt.as_str();
        run_with_retries(config, hooks, move |config| async move {
            match Backend::from_config(&config) {
                Ok(backend) => backend.complete(client, prompt).await,
                Err(e) => Err(e),
            }
        })
        .await
    }
}

fn has_key(config: &ProviderConfig) -> bool {
    config
        .api_key
        .as_deref()
        .is_some_and(|k| !k.trim().is_empty())
}

/// Attempt loop shared by every backend.
///
/// A 401 from a provider that supports re-entry asks `hooks` for a new key
/// once and retries immediately; the retry counts as an attempt. Other
/// retryable failures sleep per the policy's backoff.
pub(crate) async fn run_with_retries<F, Fut>(
    mut config: ProviderConfig,
    hooks: &dyn DispatchHooks,
    mut attempt: F,
) -> Result<CommitMessage, ProviderError>
where
    F: FnMut(ProviderConfig) -> Fut,
    Fut: Future<Output = Result<String, ProviderError>>,
{
    let provider = config.provider;
    let max_attempts = config.retry.attempts();
    let mut backoff = config.retry.backoff();
    let mut reauthenticated = false;
    let mut attempts = 0;

    loop {
        attempts += 1;

        let error = match attempt(config.clone()).await.and_then(|raw| finish(provider, &config.model, &raw)) {
            Ok(message) => {
                info!("{} produced a message after {} attempt(s)", provider, attempts);
                return Ok(message);
            }
            Err(e) => e,
        };

        if error.is_unauthorized() && provider.reprompts_on_unauthorized() && !reauthenticated {
            reauthenticated = true;
            warn!("{} rejected the API key, requesting a new one", provider);
            match hooks.request_credential(provider).await {
                Some(key) => {
                    config.api_key = Some(key);
                    continue;
                }
                None => return Err(error),
            }
        }

        if !error.is_retryable() || attempts >= max_attempts {
            debug!("Giving up on {} after {} attempt(s): {}", provider, attempts, error);
            return Err(error);
        }

        let delay = backoff.next_backoff().unwrap_or(config.retry.max_backoff);
        warn!(
            "Attempt {}/{} to {} failed: {}. Retrying in {:?}",
            attempts, max_attempts, provider, error, delay
        );
        hooks.on_retry(attempts + 1, max_attempts, &error, delay);
        tokio::time::sleep(delay).await;
    }
}

/// Clean raw output; an empty result is a failure, never a placeholder.
fn finish(provider: Provider, model: &str, raw: &str) -> Result<CommitMessage, ProviderError> {
    let text = clean_message(raw);
    if text.is_empty() {
        return Err(ProviderError::EmptyGeneratedMessage { provider });
    }
    Ok(CommitMessage {
        text,
        model: model.to_string(),
    })
}

/// Cut `prompt` to `max_chars`, keeping the response instruction last.
pub fn fit_prompt(prompt: &str, max_chars: usize) -> String {
    if prompt.len() <= max_chars {
        return prompt.to_string();
    }

    let body = prompt
        .strip_suffix(RESPONSE_INSTRUCTION)
        .unwrap_or(prompt)
        .trim_end();
    let budget = max_chars.saturating_sub(RESPONSE_INSTRUCTION.len() + TRUNCATION_MARKER.len() + 3);
    let (truncated, _) = truncate_with_marker(body, budget);
    debug!("Prompt truncated from {} to {} bytes", prompt.len(), truncated.len());
    format!("{truncated}\n\n{RESPONSE_INSTRUCTION}")
}
