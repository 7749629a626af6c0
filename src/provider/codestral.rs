//! Mistral Codestral backend, speaking the OpenAI chat format.

use reqwest::Client;

use crate::error::ProviderError;
use crate::provider::Provider;
use crate::provider::backend::Endpoint;
use crate::provider::openai::complete_chat;

#[derive(Debug, Clone)]
pub struct CodestralBackend {
    endpoint: Endpoint,
}

impl CodestralBackend {
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub async fn complete(&self, client: &Client, prompt: &str) -> Result<String, ProviderError> {
        complete_chat(Provider::Codestral, &self.endpoint, client, prompt).await
    }
}
