use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::{EmbeddingsConfig, PROVIDER_FAKE, PROVIDER_NLPCLOUD};
use crate::error::{EmbedError, EmbedResult};

pub mod fake;
pub mod nlpcloud;

#[async_trait]
pub trait Embedder: Send + Sync {
    /// One vector per text, in input order.
    async fn embed_documents(&self, texts: &[String]) -> EmbedResult<Vec<Vec<f32>>>;
    async fn embed_query(&self, text: &str) -> EmbedResult<Vec<f32>>;
    fn name(&self) -> &'static str;
    fn model_id(&self) -> String;
}

/// Binds the configured provider.
pub fn build_embedder(config: &EmbeddingsConfig) -> EmbedResult<Arc<dyn Embedder>> {
    let embedder: Arc<dyn Embedder> = match config.provider.as_str() {
        PROVIDER_NLPCLOUD => Arc::new(nlpcloud::NlpCloudEmbedder::new(config)?),
        PROVIDER_FAKE => {
            if config.dimension == 0 {
                return Err(EmbedError::Config {
                    message: "dimension must be at least 1".to_string(),
                });
            }
            Arc::new(fake::FakeEmbedder::new(&config.model, config.dimension))
        }
        other => {
            return Err(EmbedError::Config {
                message: format!(
                    "unknown embeddings provider '{}' (expected '{}' or '{}')",
                    other, PROVIDER_NLPCLOUD, PROVIDER_FAKE
                ),
            })
        }
    };
    info!(provider = embedder.name(), model = %embedder.model_id(), "embedder ready");
    Ok(embedder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_provider_fails_fast() {
        let config = EmbeddingsConfig::default().with_provider("openai");
        let err = build_embedder(&config).err().unwrap();
        assert!(matches!(err, EmbedError::Config { ref message } if message.contains("openai")));
    }

    #[test]
    fn fake_provider_needs_a_dimension() {
        let config = EmbeddingsConfig::default()
            .with_provider("fake")
            .with_dimension(0);
        assert!(build_embedder(&config).is_err());

        let embedder = build_embedder(&config.with_dimension(4)).unwrap();
        assert_eq!(embedder.name(), "fake");
    }

    #[test]
    fn nlpcloud_with_explicit_key_builds() {
        let config = EmbeddingsConfig::default().with_api_key("key");
        let embedder = build_embedder(&config).unwrap();
        assert_eq!(embedder.name(), "nlpcloud");
        assert_eq!(embedder.model_id(), "paraphrase-multilingual-mpnet-base-v2");
    }
}
