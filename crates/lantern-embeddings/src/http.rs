//! HTTP layer: status mapping and retry.
//!
//! Providers build URLs and bodies; status codes are interpreted only here.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::EmbeddingsConfig;
use crate::error::{EmbedError, EmbedResult};

const USER_AGENT_VALUE: &str = concat!("lantern-embeddings/", env!("CARGO_PKG_VERSION"));

/// Upper bound for a single backoff sleep.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub(crate) struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    auth_header: String,
    max_retries: u32,
    retry_backoff: Duration,
}

impl std::fmt::Debug for HttpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBackend")
            .field("base_url", &self.base_url)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl HttpBackend {
    /// `auth_header` is the full `Authorization` value, scheme included.
    pub(crate) fn new(config: &EmbeddingsConfig, auth_header: String) -> EmbedResult<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(default_headers)
            .build()
            .map_err(|e| EmbedError::Network {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_header,
            max_retries: config.max_retries,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        })
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// POSTs `body` as JSON to `path` and decodes the JSON response,
    /// retrying transient failures.
    pub(crate) async fn post_json<B, T>(&self, path: &str, body: &B) -> EmbedResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        let mut retries = 0;

        loop {
            match self.post_once(&url, body).await {
                Ok(response) => {
                    return response.json::<T>().await.map_err(|e| EmbedError::InvalidResponse {
                        message: format!("failed to decode response body: {}", e),
                    })
                }
                Err(e) if e.is_retryable() && retries < self.max_retries => {
                    retries += 1;
                    let backoff = self.backoff(&e, retries);

                    warn!(
                        error = %e,
                        retry = retries,
                        max_retries = self.max_retries,
                        backoff_ms = backoff.as_millis(),
                        "retrying request"
                    );

                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn backoff(&self, error: &EmbedError, retry: u32) -> Duration {
        use rand::Rng;

        match error {
            EmbedError::RateLimited {
                retry_after: Some(retry_after),
            } => {
                let base_ms = (*retry_after).min(MAX_BACKOFF).as_millis() as u64;
                let jitter_factor: f64 = rand::thread_rng().gen_range(0.9_f64..=1.1_f64);
                let jittered_ms = ((base_ms as f64) * jitter_factor).round() as u64;
                Duration::from_millis(jittered_ms.max(100))
            }
            _ => {
                let base = self
                    .retry_backoff
                    .saturating_mul(1 << retry.saturating_sub(1).min(16))
                    .min(MAX_BACKOFF);
                let jittered_ms = rand::thread_rng().gen_range(0..=base.as_millis() as u64);
                Duration::from_millis(jittered_ms.max(1))
            }
        }
    }

    async fn post_once<B>(&self, url: &str, body: &B) -> EmbedResult<reqwest::Response>
    where
        B: Serialize + ?Sized,
    {
        debug!(url = %url, "POST");
        let response = self
            .client
            .post(url)
            .header(AUTHORIZATION, &self.auth_header)
            .json(body)
            .send()
            .await?;
        let status = response.status();

        match status.as_u16() {
            200..=299 => Ok(response),

            401 | 403 => {
                let message = response.text().await.unwrap_or_default();
                Err(EmbedError::Unauthorized {
                    message: if message.is_empty() {
                        "invalid or missing API key".to_string()
                    } else {
                        message
                    },
                })
            }

            429 => {
                let retry_after = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .map(Duration::from_secs);

                Err(EmbedError::RateLimited { retry_after })
            }

            code @ 500..=599 => {
                let message = response.text().await.unwrap_or_else(|_| status.to_string());
                Err(EmbedError::Server {
                    status: code,
                    message,
                })
            }

            code => {
                let message = response.text().await.unwrap_or_else(|_| status.to_string());
                Err(EmbedError::Api {
                    status: code,
                    message,
                })
            }
        }
    }
}
