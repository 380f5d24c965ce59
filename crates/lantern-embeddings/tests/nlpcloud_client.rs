//! Integration tests for NlpCloudEmbedder.
//!
//! Uses wiremock for HTTP mocking. Tests cover the request shape (path,
//! auth header, body), status mapping (401/403/422/429/5xx) and retry behavior.

use lantern_embeddings::{EmbedError, Embedder, EmbeddingsConfig, NlpCloudEmbedder};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL_PATH: &str = "/paraphrase-multilingual-mpnet-base-v2/embeddings";

fn test_config(mock_server: &MockServer) -> EmbeddingsConfig {
    EmbeddingsConfig::default()
        .with_base_url(mock_server.uri())
        .with_api_key("test-key")
        .with_retry_backoff_ms(5)
}

fn create_test_embedder(mock_server: &MockServer) -> NlpCloudEmbedder {
    NlpCloudEmbedder::new(&test_config(mock_server)).expect("failed to create embedder")
}

#[tokio::test]
async fn test_embed_documents_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .and(header("authorization", "Token test-key"))
        .and(body_json(json!({ "sentences": ["hello", "world"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embeddings": [[0.1, 0.2, 0.3], [0.4, 0.5, 0.6]]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let embedder = create_test_embedder(&mock_server);
    let vectors = embedder
        .embed_documents(&["hello".to_string(), "world".to_string()])
        .await
        .expect("embed failed");

    assert_eq!(vectors, vec![vec![0.1, 0.2, 0.3], vec![0.4, 0.5, 0.6]]);
}

#[tokio::test]
async fn test_embed_query_sends_one_sentence() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .and(body_json(json!({ "sentences": ["what is a run?"] })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "embeddings": [[1.0, 0.0]] })),
        )
        .mount(&mock_server)
        .await;

    let embedder = create_test_embedder(&mock_server);
    let vector = embedder.embed_query("what is a run?").await.expect("embed failed");
    assert_eq!(vector, vec![1.0, 0.0]);
}

#[tokio::test]
async fn test_gpu_and_language_prefix_the_path() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/gpu/fra_Latn/custom-model/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "embeddings": [[0.5]] })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = test_config(&mock_server)
        .with_model("custom-model")
        .with_gpu(true)
        .with_lang("fra_Latn");
    let embedder = NlpCloudEmbedder::new(&config).unwrap();
    assert_eq!(embedder.embed_query("bonjour").await.unwrap(), vec![0.5]);
}

#[tokio::test]
async fn test_empty_input_makes_no_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&mock_server)
        .await;

    let embedder = create_test_embedder(&mock_server);
    assert!(embedder.embed_documents(&[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unauthorized() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&mock_server)
        .await;

    let embedder = create_test_embedder(&mock_server);
    let result = embedder.embed_query("x").await;
    assert!(matches!(result, Err(EmbedError::Unauthorized { .. })));
}

#[tokio::test]
async fn test_forbidden_maps_to_unauthorized() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_string("plan does not include model"))
        .mount(&mock_server)
        .await;

    let embedder = create_test_embedder(&mock_server);
    match embedder.embed_query("x").await {
        Err(EmbedError::Unauthorized { message }) => {
            assert_eq!(message, "plan does not include model")
        }
        other => panic!("expected Unauthorized, got {:?}", other),
    }
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(422).set_body_string("sentences too long"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let embedder = create_test_embedder(&mock_server);
    match embedder.embed_query("x").await {
        Err(EmbedError::Api { status, message }) => {
            assert_eq!(status, 422);
            assert!(message.contains("too long"));
        }
        other => panic!("expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_server_error_retries_then_succeeds() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "embeddings": [[0.25]] })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let embedder = create_test_embedder(&mock_server);
    assert_eq!(embedder.embed_query("x").await.unwrap(), vec![0.25]);
}

#[tokio::test]
async fn test_retries_are_bounded() {
    let mock_server = MockServer::start().await;

    // One attempt plus two retries.
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&mock_server)
        .await;

    let embedder = create_test_embedder(&mock_server);
    let result = embedder.embed_query("x").await;
    assert!(matches!(
        result,
        Err(EmbedError::RateLimited { retry_after: None })
    ));
}

#[tokio::test]
async fn test_retries_disabled() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = test_config(&mock_server).with_max_retries(0);
    let embedder = NlpCloudEmbedder::new(&config).unwrap();
    match embedder.embed_query("x").await {
        Err(EmbedError::Server { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "boom");
        }
        other => panic!("expected Server error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_count_mismatch_is_invalid_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "embeddings": [[0.1]] })))
        .mount(&mock_server)
        .await;

    let embedder = create_test_embedder(&mock_server);
    let result = embedder
        .embed_documents(&["a".to_string(), "b".to_string()])
        .await;
    assert!(matches!(result, Err(EmbedError::InvalidResponse { .. })));
}

#[tokio::test]
async fn test_malformed_body_is_invalid_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&mock_server)
        .await;

    let embedder = create_test_embedder(&mock_server);
    let result = embedder.embed_query("x").await;
    assert!(matches!(result, Err(EmbedError::InvalidResponse { .. })));
}
