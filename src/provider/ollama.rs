//! Ollama `/api/chat` backend. Authentication is optional.

use reqwest::Client;
use serde_json::{Value, json};

use crate::error::ProviderError;
use crate::provider::Provider;
use crate::provider::backend::{Endpoint, send_json, text_at};

#[derive(Debug, Clone)]
pub struct OllamaBackend {
    endpoint: Endpoint,
}

impl OllamaBackend {
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub async fn complete(&self, client: &Client, prompt: &str) -> Result<String, ProviderError> {
        let mut request = client
            .post(self.endpoint.url("api/chat"))
            .timeout(self.endpoint.timeout)
            .json(&request_body(&self.endpoint.model, prompt));

        if let Some(key) = &self.endpoint.api_key {
            request = request.bearer_auth(key);
        }

        let body = send_json(Provider::Ollama, request).await?;
        text_at(Provider::Ollama, &body, "/message/content")
    }
}

fn request_body(model: &str, prompt: &str) -> Value {
    json!({
        "model": model,
        "messages": [
            {"role": "user", "content": prompt}
        ],
        "stream": false
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_disables_streaming() {
        let body = request_body("llama3.2", "hi");
        assert_eq!(body["stream"], false);
        assert_eq!(body["model"], "llama3.2");
        assert_eq!(body["messages"][0]["content"], "hi");
    }
}
