//! Text embedding adapters.
//!
//! The [`Embedder`] trait turns documents and queries into vectors. The
//! provider is bound once at startup by [`build_embedder`]; a missing
//! credential or an unknown provider fails there rather than on first use.
//!
//! # Quick Start
//!
//! ```no_run
//! use lantern_embeddings::{build_embedder, EmbeddingsConfig};
//!
//! # async fn example() -> Result<(), lantern_embeddings::EmbedError> {
//! let embedder = build_embedder(&EmbeddingsConfig::from_env())?;
//! let vectors = embedder
//!     .embed_documents(&["first".to_string(), "second".to_string()])
//!     .await?;
//! assert_eq!(vectors.len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `NLPCLOUD_API_KEY` | NLP Cloud API key |
//! | `LANTERN_EMBEDDINGS_PROVIDER` | `nlpcloud` (default) or `fake` |
//! | `LANTERN_EMBEDDINGS_MODEL` | Model name (default: `paraphrase-multilingual-mpnet-base-v2`) |
//! | `LANTERN_EMBEDDINGS_GPU` | Run on GPU instances (`1`/`true`) |
//! | `LANTERN_EMBEDDINGS_LANG` | Language prefix (default: `en`, which adds none) |
//! | `LANTERN_EMBEDDINGS_URL` | API base URL (default: `https://api.nlpcloud.io/v1`) |
//! | `LANTERN_EMBEDDINGS_TIMEOUT` | Request timeout in seconds (default: 30) |
//! | `LANTERN_EMBEDDINGS_MAX_RETRIES` | Max retries for transient failures (default: 2) |
//! | `LANTERN_EMBEDDINGS_DIMENSION` | Vector size of the fake provider (default: 768) |

pub mod config;
pub mod embedder;
pub mod error;
mod http;

pub use config::{EmbeddingsConfig, API_KEY_ENV};
pub use embedder::fake::FakeEmbedder;
pub use embedder::nlpcloud::NlpCloudEmbedder;
pub use embedder::{build_embedder, Embedder};
pub use error::{EmbedError, EmbedResult};
