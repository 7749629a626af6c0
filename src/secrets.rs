//! Provider API key storage.

use std::collections::HashMap;
use std::env;
use std::sync::RwLock;

use tracing::{debug, warn};

use crate::provider::Provider;

/// Per-provider credential storage.
pub trait SecretStore: Send + Sync {
    fn get(&self, provider: Provider) -> Option<String>;
    fn set(&self, provider: Provider, key: String);
    fn delete(&self, provider: Provider);
}

/// Keys from the environment, overlaid by keys entered during this process.
///
/// Entered keys are kept in memory only.
#[derive(Debug, Default)]
pub struct EnvSecretStore {
    overrides: RwLock<HashMap<Provider, Option<String>>>,
}

impl EnvSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn from_env(provider: Provider) -> Option<String> {
        provider
            .api_key_env_vars()
            .iter()
            .filter_map(|name| env::var(name).ok())
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty())
    }
}

impl SecretStore for EnvSecretStore {
    fn get(&self, provider: Provider) -> Option<String> {
        let overridden = match self.overrides.read() {
            Ok(map) => map.get(&provider).cloned(),
            Err(poisoned) => {
                warn!("Secret store lock poisoned, recovering");
                poisoned.into_inner().get(&provider).cloned()
            }
        };

        match overridden {
            Some(value) => value,
            None => Self::from_env(provider),
        }
    }

    fn set(&self, provider: Provider, key: String) {
        debug!("Storing API key for {} for this session", provider);
        let mut map = self.overrides.write().unwrap_or_else(|p| p.into_inner());
        map.insert(provider, Some(key));
    }

    /// Hides the environment key as well, until the next `set`.
    fn delete(&self, provider: Provider) {
        let mut map = self.overrides.write().unwrap_or_else(|p| p.into_inner());
        map.insert(provider, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_reads_environment() {
        temp_env::with_var("OPENAI_API_KEY", Some(" sk-env "), || {
            let store = EnvSecretStore::new();
            assert_eq!(store.get(Provider::OpenAi).as_deref(), Some("sk-env"));
        });
    }

    #[test]
    #[serial]
    fn test_codestral_falls_back_to_mistral_key() {
        temp_env::with_vars(
            [("CODESTRAL_API_KEY", None), ("MISTRAL_API_KEY", Some("m-key"))],
            || {
                let store = EnvSecretStore::new();
                assert_eq!(store.get(Provider::Codestral).as_deref(), Some("m-key"));
            },
        );
    }

    #[test]
    #[serial]
    fn test_set_overrides_and_delete_hides() {
        temp_env::with_var("GEMINI_API_KEY", Some("env-key"), || {
            let store = EnvSecretStore::new();
            store.set(Provider::Gemini, "entered".to_string());
            assert_eq!(store.get(Provider::Gemini).as_deref(), Some("entered"));

            store.delete(Provider::Gemini);
            assert_eq!(store.get(Provider::Gemini), None);
        });
    }

    #[test]
    #[serial]
    fn test_missing_key() {
        temp_env::with_var("OLLAMA_API_KEY", None::<&str>, || {
            assert_eq!(EnvSecretStore::new().get(Provider::Ollama), None);
        });
    }
}
