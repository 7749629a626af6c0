//! Shared HTTP plumbing and the tagged backend enum.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use tracing::debug;

use crate::error::ProviderError;
use crate::provider::codestral::CodestralBackend;
use crate::provider::gemini::GeminiBackend;
use crate::provider::ollama::OllamaBackend;
use crate::provider::openai::OpenAiBackend;
use crate::provider::{Provider, ProviderConfig};

/// Longest error body excerpt carried in an error message.
const MAX_ERROR_DETAIL: usize = 300;

/// Where and how to reach one backend.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Endpoint {
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// The API key, or an empty string for unauthenticated backends.
    pub fn key(&self) -> &str {
        self.api_key.as_deref().unwrap_or_default()
    }
}

/// One variant per provider; each performs a single request.
#[derive(Debug, Clone)]
pub enum Backend {
    Gemini(GeminiBackend),
    OpenAi(OpenAiBackend),
    Codestral(CodestralBackend),
    Ollama(OllamaBackend),
}

impl Backend {
    /// Build the backend for `config`, failing fast on a missing key.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string);

        if config.provider.requires_api_key() && api_key.is_none() {
            return Err(ProviderError::MissingApiKey(config.provider));
        }

        let endpoint = Endpoint {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            timeout: config.timeout,
        };

        Ok(match config.provider {
            Provider::Gemini => Backend::Gemini(GeminiBackend::new(endpoint)),
            Provider::OpenAi => Backend::OpenAi(OpenAiBackend::new(endpoint)),
            Provider::Codestral => Backend::Codestral(CodestralBackend::new(endpoint)),
            Provider::Ollama => Backend::Ollama(OllamaBackend::new(endpoint)),
        })
    }

    /// One HTTP attempt, returning the raw generated text.
    pub async fn complete(&self, client: &Client, prompt: &str) -> Result<String, ProviderError> {
        match self {
            Backend::Gemini(b) => b.complete(client, prompt).await,
            Backend::OpenAi(b) => b.complete(client, prompt).await,
            Backend::Codestral(b) => b.complete(client, prompt).await,
            Backend::Ollama(b) => b.complete(client, prompt).await,
        }
    }
}

/// Send `request` and decode a successful JSON body.
///
/// Non-success statuses go through [`classify_status`]; transport problems
/// become [`ProviderError::TransportFailure`].
pub(crate) async fn send_json(
    provider: Provider,
    request: RequestBuilder,
) -> Result<Value, ProviderError> {
    let response = request
        .send()
        .await
        .map_err(|e| transport_failure(provider, &e))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| transport_failure(provider, &e))?;

    debug!("{} responded with HTTP {} ({} bytes)", provider, status, body.len());

    if !status.is_success() {
        return Err(classify_status(provider, status, &body));
    }

    serde_json::from_str(&body).map_err(|e| ProviderError::MalformedResponse {
        provider,
        detail: format!("invalid JSON: {e}"),
    })
}

/// Pull the string at `path` out of a response body.
pub(crate) fn text_at(provider: Provider, body: &Value, pointer: &str) -> Result<String, ProviderError> {
    match body.pointer(pointer) {
        Some(Value::String(text)) => Ok(text.clone()),
        Some(Value::Null) | None => Err(ProviderError::MalformedResponse {
            provider,
            detail: format!("missing {pointer}"),
        }),
        Some(other) => Err(ProviderError::MalformedResponse {
            provider,
            detail: format!("expected text at {pointer}, found {other}"),
        }),
    }
}

/// Map a non-success HTTP status onto the shared failure classes.
pub fn classify_status(provider: Provider, status: StatusCode, body: &str) -> ProviderError {
    let code = status.as_u16();
    match code {
        401 | 403 => ProviderError::AuthenticationRejected {
            provider,
            status: code,
        },
        402 => ProviderError::QuotaOrBilling { provider },
        422 => ProviderError::InvalidRequest {
            provider,
            detail: error_detail(body),
        },
        429 => ProviderError::RateLimited { provider },
        500..=599 => ProviderError::ServerError {
            provider,
            status: code,
        },
        _ => ProviderError::ClientError {
            provider,
            status: code,
            detail: error_detail(body),
        },
    }
}

fn transport_failure(provider: Provider, err: &reqwest::Error) -> ProviderError {
    let detail = if err.is_timeout() {
        "request timed out".to_string()
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else {
        err.to_string()
    };
    ProviderError::TransportFailure { provider, detail }
}

/// Prefer the API's own `error.message`; fall back to a body excerpt.
fn error_detail(body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let message = parsed.as_ref().and_then(|v| {
        v.pointer("/error/message")
            .or_else(|| v.get("error"))
            .or_else(|| v.get("message"))
            .and_then(Value::as_str)
    });

    match message {
        Some(m) => m.to_string(),
        None => body.trim().chars().take(MAX_ERROR_DETAIL).collect(),
    }
}
