//! Environment-driven configuration. Serialized: tests mutate process env.

use lantern_embeddings::{build_embedder, EmbedError, EmbeddingsConfig, API_KEY_ENV};
use serial_test::serial;

const VARS: &[&str] = &[
    API_KEY_ENV,
    "LANTERN_EMBEDDINGS_PROVIDER",
    "LANTERN_EMBEDDINGS_MODEL",
    "LANTERN_EMBEDDINGS_GPU",
    "LANTERN_EMBEDDINGS_LANG",
    "LANTERN_EMBEDDINGS_URL",
    "LANTERN_EMBEDDINGS_TIMEOUT",
    "LANTERN_EMBEDDINGS_MAX_RETRIES",
    "LANTERN_EMBEDDINGS_DIMENSION",
];

fn clear_env() {
    for var in VARS {
        std::env::remove_var(var);
    }
}

#[test]
#[serial]
fn defaults_without_env() {
    clear_env();
    let config = EmbeddingsConfig::from_env();
    assert_eq!(config, EmbeddingsConfig::default());
    assert_eq!(config.base_url, "https://api.nlpcloud.io/v1");
}

#[test]
#[serial]
fn env_overrides_defaults() {
    clear_env();
    std::env::set_var("LANTERN_EMBEDDINGS_PROVIDER", "fake");
    std::env::set_var("LANTERN_EMBEDDINGS_GPU", "TRUE");
    std::env::set_var("LANTERN_EMBEDDINGS_LANG", "deu_Latn");
    std::env::set_var("LANTERN_EMBEDDINGS_MAX_RETRIES", "5");
    std::env::set_var("LANTERN_EMBEDDINGS_DIMENSION", "not-a-number");
    std::env::set_var(API_KEY_ENV, "env-key");

    let config = EmbeddingsConfig::from_env();
    assert_eq!(config.provider, "fake");
    assert!(config.gpu);
    assert_eq!(config.lang, "deu_Latn");
    assert_eq!(config.max_retries, 5);
    assert_eq!(config.dimension, 768, "unparsable values keep the default");
    assert_eq!(config.api_key.as_deref(), Some("env-key"));
    clear_env();
}

#[test]
#[serial]
fn missing_credential_fails_at_build() {
    clear_env();
    let err = build_embedder(&EmbeddingsConfig::from_env()).err().unwrap();
    assert!(matches!(
        err,
        EmbedError::MissingCredential {
            env: "NLPCLOUD_API_KEY"
        }
    ));

    std::env::set_var(API_KEY_ENV, "   ");
    assert!(build_embedder(&EmbeddingsConfig::default()).is_err());
    clear_env();
}

#[test]
#[serial]
fn yaml_config_falls_back_to_env_key() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("embeddings.yaml");
    std::fs::write(&path, "model: all-mpnet-base-v2\nmax_retries: 0\n").unwrap();

    let config = EmbeddingsConfig::load(&path).unwrap();
    assert_eq!(config.model, "all-mpnet-base-v2");
    assert!(config.api_key.is_none());
    assert!(build_embedder(&config).is_err());

    std::env::set_var(API_KEY_ENV, "from-env");
    let embedder = build_embedder(&config).unwrap();
    assert_eq!(embedder.model_id(), "all-mpnet-base-v2");
    clear_env();
}
