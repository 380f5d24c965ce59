//! Embedding provider configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EmbedError, EmbedResult};

/// Environment variable holding the NLP Cloud API key.
pub const API_KEY_ENV: &str = "NLPCLOUD_API_KEY";

pub const PROVIDER_NLPCLOUD: &str = "nlpcloud";
pub const PROVIDER_FAKE: &str = "fake";

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmbeddingsConfig {
    /// `nlpcloud` or `fake`.
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default)]
    pub gpu: bool,

    /// Language of the texts. `en` needs no prefix on the endpoint.
    #[serde(default = "default_lang")]
    pub lang: String,

    /// Falls back to `NLPCLOUD_API_KEY` when unset.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay of the exponential retry backoff.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Vector size produced by the fake provider.
    #[serde(default = "default_dimension")]
    pub dimension: usize,
}

fn default_provider() -> String {
    PROVIDER_NLPCLOUD.to_string()
}

fn default_model() -> String {
    "paraphrase-multilingual-mpnet-base-v2".to_string()
}

fn default_lang() -> String {
    "en".to_string()
}

fn default_base_url() -> String {
    "https://api.nlpcloud.io/v1".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_dimension() -> usize {
    768
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            gpu: false,
            lang: default_lang(),
            api_key: None,
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            dimension: default_dimension(),
        }
    }
}

// Keeps the API key out of logs.
impl std::fmt::Debug for EmbeddingsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingsConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("gpu", &self.gpu)
            .field("lang", &self.lang)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("dimension", &self.dimension)
            .finish()
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

impl EmbeddingsConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `LANTERN_EMBEDDINGS_PROVIDER` | Provider name |
    /// | `LANTERN_EMBEDDINGS_MODEL` | Model name |
    /// | `LANTERN_EMBEDDINGS_GPU` | Use GPU endpoints |
    /// | `LANTERN_EMBEDDINGS_LANG` | Text language |
    /// | `LANTERN_EMBEDDINGS_URL` | API base URL |
    /// | `LANTERN_EMBEDDINGS_TIMEOUT` | Request timeout in seconds |
    /// | `LANTERN_EMBEDDINGS_MAX_RETRIES` | Max retries |
    /// | `LANTERN_EMBEDDINGS_DIMENSION` | Fake vector size |
    /// | `NLPCLOUD_API_KEY` | API key |
    pub fn from_env() -> Self {
        Self::default().merge_env()
    }

    /// Reads a YAML config file. Environment variables do not override it,
    /// except that a missing `api_key` is still taken from `NLPCLOUD_API_KEY`
    /// when the embedder is built.
    pub fn load(path: &Path) -> EmbedResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| EmbedError::Config {
            message: format!("failed to read {}: {}", path.display(), e),
        })?;
        Self::from_yaml(&content).map_err(|e| match e {
            EmbedError::Config { message } => EmbedError::Config {
                message: format!("{}: {}", path.display(), message),
            },
            other => other,
        })
    }

    pub fn from_yaml(content: &str) -> EmbedResult<Self> {
        // An empty document means all defaults.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| EmbedError::Config {
            message: format!("invalid embeddings config: {}", e),
        })
    }

    fn merge_env(mut self) -> Self {
        if let Ok(provider) = std::env::var("LANTERN_EMBEDDINGS_PROVIDER") {
            self.provider = provider;
        }
        if let Ok(model) = std::env::var("LANTERN_EMBEDDINGS_MODEL") {
            self.model = model;
        }
        if let Ok(gpu) = std::env::var("LANTERN_EMBEDDINGS_GPU") {
            self.gpu = gpu == "1" || gpu.eq_ignore_ascii_case("true");
        }
        if let Ok(lang) = std::env::var("LANTERN_EMBEDDINGS_LANG") {
            self.lang = lang;
        }
        if let Ok(url) = std::env::var("LANTERN_EMBEDDINGS_URL") {
            self.base_url = url;
        }
        self.api_key = std::env::var(API_KEY_ENV).ok().or(self.api_key);
        self.timeout_secs = env_parse("LANTERN_EMBEDDINGS_TIMEOUT").unwrap_or(self.timeout_secs);
        self.max_retries = env_parse("LANTERN_EMBEDDINGS_MAX_RETRIES").unwrap_or(self.max_retries);
        self.dimension = env_parse("LANTERN_EMBEDDINGS_DIMENSION").unwrap_or(self.dimension);
        self
    }

    /// The configured key, else `NLPCLOUD_API_KEY`. Blank keys count as missing.
    pub fn resolve_api_key(&self) -> EmbedResult<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty())
            .ok_or(EmbedError::MissingCredential { env: API_KEY_ENV })
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_gpu(mut self, gpu: bool) -> Self {
        self.gpu = gpu;
        self
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_backoff_ms(mut self, backoff_ms: u64) -> Self {
        self.retry_backoff_ms = backoff_ms;
        self
    }

    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }
}
