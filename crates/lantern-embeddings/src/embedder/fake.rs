use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::Embedder;
use crate::error::EmbedResult;

/// Offline embedder: the same text always maps to the same unit vector.
#[derive(Debug, Clone)]
pub struct FakeEmbedder {
    pub model: String,
    dimension: usize,
    calls: Arc<AtomicUsize>,
}

impl FakeEmbedder {
    pub fn new(model: &str, dimension: usize) -> Self {
        Self {
            model: model.to_string(),
            dimension,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of `embed_documents` / `embed_query` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Vector for `text`, expanded from SHA-256 blocks over `(block, text)`.
    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut vector = Vec::with_capacity(self.dimension);
        let mut block: u32 = 0;
        while vector.len() < self.dimension {
            let mut hasher = Sha256::new();
            hasher.update(block.to_le_bytes());
            hasher.update(text.as_bytes());
            let digest = hasher.finalize();
            vector.extend(
                digest
                    .iter()
                    .take(self.dimension - vector.len())
                    .map(|b| f32::from(*b) / 127.5 - 1.0),
            );
            block += 1;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed_documents(&self, texts: &[String]) -> EmbedResult<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|text| self.vector_for(text)).collect())
    }

    async fn embed_query(&self, text: &str) -> EmbedResult<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.vector_for(text))
    }

    fn name(&self) -> &'static str {
        "fake"
    }

    fn model_id(&self) -> String {
        self.model.clone()
    }
}
