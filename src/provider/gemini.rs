//! Google Gemini `generateContent` backend.

use reqwest::Client;
use serde_json::{Value, json};

use crate::error::ProviderError;
use crate::provider::Provider;
use crate::provider::backend::{Endpoint, send_json, text_at};

#[derive(Debug, Clone)]
pub struct GeminiBackend {
    endpoint: Endpoint,
}

impl GeminiBackend {
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// `POST {base}/models/{model}:generateContent?key=...`
    pub async fn complete(&self, client: &Client, prompt: &str) -> Result<String, ProviderError> {
        let url = self
            .endpoint
            .url(&format!("models/{}:generateContent", self.endpoint.model));

        let request = client
            .post(url)
            .query(&[("key", self.endpoint.key())])
            .timeout(self.endpoint.timeout)
            .json(&request_body(prompt));

        let body = send_json(Provider::Gemini, request).await?;
        text_at(Provider::Gemini, &body, "/candidates/0/content/parts/0/text")
    }
}

fn request_body(prompt: &str) -> Value {
    json!({
        "contents": [
            {
                "role": "user",
                "parts": [{"text": prompt}]
            }
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let body = request_body("hello");
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
    }
}
