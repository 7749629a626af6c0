//! OpenAI chat completions backend. The request shape is shared with
//! Codestral.

use reqwest::Client;
use serde_json::{Value, json};

use crate::error::ProviderError;
use crate::provider::Provider;
use crate::provider::backend::{Endpoint, send_json, text_at};

/// Chat completions request body with a single user message.
pub(crate) fn chat_body(model: &str, prompt: &str) -> Value {
    json!({
        "model": model,
        "messages": [
            {"role": "user", "content": prompt}
        ]
    })
}

/// `POST {base}/chat/completions` with bearer auth.
pub(crate) async fn complete_chat(
    provider: Provider,
    endpoint: &Endpoint,
    client: &Client,
    prompt: &str,
) -> Result<String, ProviderError> {
    let request = client
        .post(endpoint.url("chat/completions"))
        .bearer_auth(endpoint.key())
        .timeout(endpoint.timeout)
        .json(&chat_body(&endpoint.model, prompt));

    let body = send_json(provider, request).await?;
    text_at(provider, &body, "/choices/0/message/content")
}

#[derive(Debug, Clone)]
pub struct OpenAiBackend {
    endpoint: Endpoint,
}

impl OpenAiBackend {
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub async fn complete(&self, client: &Client, prompt: &str) -> Result<String, ProviderError> {
        complete_chat(Provider::OpenAi, &self.endpoint, client, prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_body_shape() {
        let body = chat_body("gpt-4o-mini", "describe this");
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "describe this");
        assert_eq!(body["messages"].as_array().map(Vec::len), Some(1));
    }
}
