use async_trait::async_trait;
use core_config::{ConfigError, FromEnv, env_or_default, env_parse_or_default, env_required};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument};

use super::EmbeddingProvider;
use crate::error::EmbeddingError;
use crate::models::EmbeddingVector;

const DEFAULT_PATH: &str = "/embed";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Location of the embedding service.
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    /// e.g. `http://embeddings:8000`
    pub base_url: String,
    pub path: String,
    pub timeout_secs: u64,
}

impl EmbeddingConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            path: DEFAULT_PATH.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Full URL of the embed endpoint, tolerant of stray slashes.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.path.trim_start_matches('/')
        )
    }
}

/// Environment variables:
/// - `EMBEDDING_API_URL` (required)
/// - `EMBEDDING_PATH` (default: `/embed`)
/// - `EMBEDDING_TIMEOUT_SECS` (default: 30)
impl FromEnv for EmbeddingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: env_required("EMBEDDING_API_URL")?,
            path: env_or_default("EMBEDDING_PATH", DEFAULT_PATH),
            timeout_secs: env_parse_or_default("EMBEDDING_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
        })
    }
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    text: &'a str,
}

/// Client for the embedding service's `POST {"text": ...} -> [f64, ...]` contract.
pub struct HttpEmbeddingProvider {
    client: Client,
    endpoint: String,
    timeout_secs: u64,
}

impl HttpEmbeddingProvider {
    pub fn new(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint(),
            timeout_secs: config.timeout_secs,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn transport_error(&self, err: reqwest::Error) -> EmbeddingError {
        if err.is_timeout() {
            EmbeddingError::Timeout {
                after_secs: self.timeout_secs,
            }
        } else {
            EmbeddingError::Request(err)
        }
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    #[instrument(skip(self, text), fields(endpoint = %self.endpoint, text_len = text.len()))]
    async fn embed(&self, text: &str) -> Result<EmbeddingVector, EmbeddingError> {
        debug!("Requesting embedding");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&EmbedRequest { text })
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(e))?;
        let values: Vec<f64> =
            serde_json::from_str(&body).map_err(|e| EmbeddingError::Malformed(e.to_string()))?;

        debug!(dimensions = values.len(), "Embedding generated");
        Ok(EmbeddingVector::new(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;
    use std::io::Write;

    fn provider_for(server: &mockito::ServerGuard) -> HttpEmbeddingProvider {
        HttpEmbeddingProvider::new(&EmbeddingConfig::new(server.url()).with_timeout(5)).unwrap()
    }

    #[test]
    fn test_endpoint_joins_base_and_path() {
        let config = EmbeddingConfig::new("http://embeddings:8000/");
        assert_eq!(config.endpoint(), "http://embeddings:8000/embed");

        let config = EmbeddingConfig::new("http://embeddings:8000").with_path("v2/embed");
        assert_eq!(config.endpoint(), "http://embeddings:8000/v2/embed");
    }

    #[test]
    fn test_config_from_env() {
        temp_env::with_vars(
            [
                ("EMBEDDING_API_URL", Some("http://localhost:8000")),
                ("EMBEDDING_PATH", None::<&str>),
                ("EMBEDDING_TIMEOUT_SECS", Some("7")),
            ],
            || {
                let config = EmbeddingConfig::from_env().unwrap();
                assert_eq!(config.base_url, "http://localhost:8000");
                assert_eq!(config.path, "/embed");
                assert_eq!(config.timeout_secs, 7);
            },
        );
    }

    #[test]
    fn test_config_from_env_requires_url() {
        temp_env::with_var_unset("EMBEDDING_API_URL", || {
            let err = EmbeddingConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("EMBEDDING_API_URL"));
        });
    }

    #[tokio::test]
    async fn test_embed_posts_text_and_parses_vector() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/embed")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({"text": "calm breathing"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[0.25, -1, 3.5, 0, 2]")
            .create_async()
            .await;

        let vector = provider_for(&server).embed("calm breathing").await.unwrap();

        mock.assert_async().await;
        assert_eq!(vector.as_slice(), &[0.25, -1.0, 3.5, 0.0, 2.0]);
    }

    #[tokio::test]
    async fn test_embed_non_success_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/embed")
            .with_status(503)
            .with_body("model is loading")
            .create_async()
            .await;

        let err = provider_for(&server).embed("sleep").await.unwrap_err();
        match err {
            EmbeddingError::Status { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "model is loading");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_embed_malformed_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/embed")
            .with_status(200)
            .with_body(r#"{"embedding": [0.1, 0.2]}"#)
            .create_async()
            .await;

        let err = provider_for(&server).embed("focus").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_embed_null_body_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/embed")
            .with_status(200)
            .with_body("null")
            .create_async()
            .await;

        let err = provider_for(&server).embed("focus").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_embed_slow_service_times_out() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/embed")
            .with_status(200)
            .with_chunked_body(|w| {
                std::thread::sleep(Duration::from_secs(3));
                w.write_all(b"[0.1, 0.2]")
            })
            .create_async()
            .await;

        let provider =
            HttpEmbeddingProvider::new(&EmbeddingConfig::new(server.url()).with_timeout(1)).unwrap();

        let err = provider.embed("calm").await.unwrap_err();
        assert!(
            matches!(err, EmbeddingError::Timeout { after_secs: 1 }),
            "expected timeout, got {err:?}"
        );
    }

    #[tokio::test]
    async fn test_embed_unreachable_service() {
        let provider =
            HttpEmbeddingProvider::new(&EmbeddingConfig::new("http://127.0.0.1:1").with_timeout(2))
                .unwrap();

        let err = provider.embed("focus").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::Request(_)));
    }
}
