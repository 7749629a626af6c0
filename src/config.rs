//! Layered settings: built-in defaults, TOML config file, `SCRIVENER_*`
//! environment variables. CLI flags are applied on top by the binary.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use toml_edit::{DocumentMut, Item, Table, Value};
use tracing::debug;

use crate::commit::changeset::ScopePolicy;
use crate::error::ConfigError;
use crate::provider::{Provider, ProviderConfig, RetryPolicy};

/// Overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "SCRIVENER_CONFIG";

const ENV_PREFIX: &str = "SCRIVENER_";

/// Read-only key lookup. Keys are lowercase and dotted, e.g. `openai.model`.
pub trait ConfigSource: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
}

/// Config file values with environment overrides.
#[derive(Debug, Clone, Default)]
pub struct LayeredConfig {
    values: HashMap<String, String>,
    read_env: bool,
}

impl LayeredConfig {
    /// Load the config file (if any) and enable environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match config_path() {
            Some(path) if path.is_file() => Self::from_file(&path)?,
            Some(path) => {
                debug!("No config file at {}", path.display());
                Self::default()
            }
            None => Self::default(),
        };
        config.read_env = true;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        debug!("Loaded config from {}", path.display());
        Self::from_toml_str(&content, &path.display().to_string())
    }

    /// Parse TOML text; `origin` only labels errors.
    pub fn from_toml_str(content: &str, origin: &str) -> Result<Self, ConfigError> {
        let doc = content
            .parse::<DocumentMut>()
            .map_err(|source| ConfigError::ParseFailed {
                path: origin.to_string(),
                source,
            })?;

        let mut values = HashMap::new();
        flatten_table(doc.as_table(), "", &mut values);
        Ok(Self {
            values,
            read_env: false,
        })
    }

    /// Fixed values without environment lookup.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into().to_lowercase(), v.into()))
                .collect(),
            read_env: false,
        }
    }

    pub fn with_env(mut self) -> Self {
        self.read_env = true;
        self
    }
}

impl ConfigSource for LayeredConfig {
    fn get(&self, key: &str) -> Option<String> {
        let key = key.to_lowercase();
        if self.read_env
            && let Ok(value) = env::var(env_key(&key))
        {
            return Some(value);
        }
        self.values.get(&key).cloned()
    }
}

/// `openai.base_url` -> `SCRIVENER_OPENAI_BASE_URL`
fn env_key(key: &str) -> String {
    format!("{ENV_PREFIX}{}", key.replace(['.', '-'], "_").to_uppercase())
}

fn config_path() -> Option<PathBuf> {
    if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("scrivener").join("config.toml"))
}

fn flatten_table(table: &Table, prefix: &str, out: &mut HashMap<String, String>) {
    for (key, item) in table.iter() {
        let full = join_key(prefix, key);
        match item {
            Item::Table(inner) => flatten_table(inner, &full, out),
            Item::Value(Value::InlineTable(inner)) => {
                for (k, v) in inner.iter() {
                    if let Some(s) = scalar(v) {
                        out.insert(join_key(&full, k), s);
                    }
                }
            }
            Item::Value(v) => {
                if let Some(s) = scalar(v) {
                    out.insert(full, s);
                }
            }
            Item::None | Item::ArrayOfTables(_) => {}
        }
    }
}

fn join_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_lowercase()
    } else {
        format!("{prefix}.{}", key.to_lowercase())
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.value().clone()),
        Value::Integer(i) => Some(i.value().to_string()),
        Value::Float(f) => Some(f.value().to_string()),
        Value::Boolean(b) => Some(b.value().to_string()),
        _ => None,
    }
}

/// Resolved settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub provider: Provider,
    pub format: String,
    pub language: String,
    pub scope: ScopePolicy,
    pub auto_commit: bool,
    pub auto_push: bool,
    /// Only set when custom instructions are enabled.
    pub custom_instructions: Option<String>,
    pub retry: RetryPolicy,
    models: HashMap<Provider, String>,
    base_urls: HashMap<Provider, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            provider: Provider::Gemini,
            format: "conventional".to_string(),
            language: "en".to_string(),
            scope: ScopePolicy::Auto,
            auto_commit: false,
            auto_push: false,
            custom_instructions: None,
            retry: RetryPolicy::default(),
            models: HashMap::new(),
            base_urls: HashMap::new(),
        }
    }
}

impl Settings {
    /// Overlay every key `source` knows about onto the defaults.
    pub fn resolve(source: &dyn ConfigSource) -> Result<Self, ConfigError> {
        let mut settings = Self::default();

        if let Some(value) = source.get("provider") {
            settings.provider = Provider::parse(&value).ok_or_else(|| invalid(
                "provider",
                &value,
                "one of gemini, openai, codestral, ollama",
            ))?;
        }
        if let Some(value) = source.get("format") {
            settings.format = value;
        }
        if let Some(value) = source.get("language") {
            settings.language = value;
        }
        if parse_bool(source, "staged_only")?.unwrap_or(false) {
            settings.scope = ScopePolicy::StagedOnly;
        }
        settings.auto_commit = parse_bool(source, "auto_commit")?.unwrap_or(false);
        settings.auto_push = parse_bool(source, "auto_push")?.unwrap_or(false);

        if parse_bool(source, "use_custom_instructions")?.unwrap_or(false) {
            settings.custom_instructions = source
                .get("custom_instructions")
                .filter(|s| !s.trim().is_empty());
        }

        if let Some(n) = parse_u64(source, "max_retries")? {
            settings.retry.max_attempts = u32::try_from(n)
                .map_err(|_| invalid("max_retries", &n.to_string(), "a non-negative integer"))?;
        }
        if let Some(ms) = parse_u64(source, "initial_backoff_ms")? {
            settings.retry.initial_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_u64(source, "max_backoff_ms")? {
            settings.retry.max_backoff = Duration::from_millis(ms);
        }

        for provider in Provider::ALL {
            if let Some(model) = source.get(&format!("{}.model", provider.key())) {
                settings.models.insert(provider, model);
            }
            if let Some(url) = source.get(&format!("{}.base_url", provider.key())) {
                settings.base_urls.insert(provider, url);
            }
        }

        Ok(settings)
    }

    pub fn model_for(&self, provider: Provider) -> &str {
        self.models
            .get(&provider)
            .map(String::as_str)
            .unwrap_or(provider.default_model())
    }

    pub fn base_url_for(&self, provider: Provider) -> &str {
        self.base_urls
            .get(&provider)
            .map(String::as_str)
            .unwrap_or(provider.default_base_url())
    }

    pub fn set_model(&mut self, provider: Provider, model: impl Into<String>) {
        self.models.insert(provider, model.into());
    }

    pub fn set_base_url(&mut self, provider: Provider, url: impl Into<String>) {
        self.base_urls.insert(provider, url.into());
    }

    /// Resolved backend settings for the active provider.
    pub fn provider_config(&self, api_key: Option<String>) -> ProviderConfig {
        let mut config = ProviderConfig::new(self.provider)
            .with_model(self.model_for(self.provider))
            .with_base_url(self.base_url_for(self.provider))
            .with_retry(self.retry);
        config.api_key = api_key;
        config
    }
}

fn invalid(key: &str, value: &str, expected: &'static str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        expected,
    }
}

fn parse_bool(source: &dyn ConfigSource, key: &str) -> Result<Option<bool>, ConfigError> {
    let Some(value) = source.get(key) else {
        return Ok(None);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(Some(true)),
        "false" | "0" | "no" | "off" | "" => Ok(Some(false)),
        _ => Err(invalid(key, &value, "true or false")),
    }
}

fn parse_u64(source: &dyn ConfigSource, key: &str) -> Result<Option<u64>, ConfigError> {
    let Some(value) = source.get(key) else {
        return Ok(None);
    };
    value
        .trim()
        .parse()
        .map(Some)
        .map_err(|_| invalid(key, &value, "a non-negative integer"))
}
