//! Error types for embedding providers.

use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    /// No API key in the config or the environment.
    #[error("missing credential: set {env} or api_key in the embeddings config")]
    MissingCredential { env: &'static str },

    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("rate limited: retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    /// 5xx from the provider.
    #[error("provider error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    /// Any other non-success status.
    #[error("request rejected (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("network error: {message}")]
    Network { message: String },

    #[error("invalid response: {message}")]
    InvalidResponse { message: String },
}

impl EmbedError {
    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::MissingCredential { .. } | Self::Config { .. } => 2,
            _ => 3,
        }
    }

    /// Whether the error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::Server { .. } | Self::Network { .. }
        )
    }
}

impl From<reqwest::Error> for EmbedError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            message: err.to_string(),
        }
    }
}

pub type EmbedResult<T> = Result<T, EmbedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_errors_retry() {
        assert!(EmbedError::RateLimited { retry_after: None }.is_retryable());
        assert!(EmbedError::Server {
            status: 503,
            message: String::new()
        }
        .is_retryable());
        assert!(!EmbedError::Unauthorized {
            message: String::new()
        }
        .is_retryable());
        assert!(!EmbedError::Api {
            status: 422,
            message: String::new()
        }
        .is_retryable());
    }

    #[test]
    fn setup_errors_exit_with_config_code() {
        assert_eq!(
            EmbedError::MissingCredential {
                env: "NLPCLOUD_API_KEY"
            }
            .exit_code(),
            2
        );
        assert_eq!(
            EmbedError::Network {
                message: "reset".into()
            }
            .exit_code(),
            3
        );
    }
}
