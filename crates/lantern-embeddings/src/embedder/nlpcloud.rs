//! NLP Cloud embeddings endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Embedder;
use crate::config::EmbeddingsConfig;
use crate::error::{EmbedError, EmbedResult};
use crate::http::HttpBackend;

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    sentences: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Clone)]
pub struct NlpCloudEmbedder {
    pub model: String,
    pub gpu: bool,
    pub lang: String,
    http: HttpBackend,
}

impl NlpCloudEmbedder {
    /// Fails with [`EmbedError::MissingCredential`] when neither the config
    /// nor `NLPCLOUD_API_KEY` provides a key.
    pub fn new(config: &EmbeddingsConfig) -> EmbedResult<Self> {
        let api_key = config.resolve_api_key()?;
        if config.model.trim().is_empty() {
            return Err(EmbedError::Config {
                message: "model must not be empty".to_string(),
            });
        }
        Ok(Self {
            model: config.model.clone(),
            gpu: config.gpu,
            lang: config.lang.clone(),
            http: HttpBackend::new(config, format!("Token {}", api_key))?,
        })
    }

    pub fn from_env() -> EmbedResult<Self> {
        Self::new(&EmbeddingsConfig::from_env())
    }

    /// Path below the base URL: `[gpu/][lang/]{model}/embeddings`, with no
    /// language segment for English.
    pub fn endpoint_path(&self) -> String {
        let mut path = String::new();
        if self.gpu {
            path.push_str("gpu/");
        }
        if !self.lang.is_empty() && self.lang != "en" {
            path.push_str(&self.lang);
            path.push('/');
        }
        path.push_str(&self.model);
        path.push_str("/embeddings");
        path
    }

    pub fn endpoint_url(&self) -> String {
        self.http.url(&self.endpoint_path())
    }
}

#[async_trait]
impl Embedder for NlpCloudEmbedder {
    async fn embed_documents(&self, texts: &[String]) -> EmbedResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!(model = %self.model, count = texts.len(), "requesting embeddings");

        let response: EmbeddingsResponse = self
            .http
            .post_json(&self.endpoint_path(), &EmbeddingsRequest { sentences: texts })
            .await?;

        if response.embeddings.len() != texts.len() {
            return Err(EmbedError::InvalidResponse {
                message: format!(
                    "expected {} embeddings, got {}",
                    texts.len(),
                    response.embeddings.len()
                ),
            });
        }
        Ok(response.embeddings)
    }

    async fn embed_query(&self, text: &str) -> EmbedResult<Vec<f32>> {
        let mut vectors = self.embed_documents(&[text.to_string()]).await?;
        vectors.pop().ok_or_else(|| EmbedError::InvalidResponse {
            message: "no embedding returned for query".to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "nlpcloud"
    }

    fn model_id(&self) -> String {
        self.model.clone()
    }
}
