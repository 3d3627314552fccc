//! Inference client
//!
//! A single GET against the inference backend. The backend's response body
//! is the output, returned untouched.

use async_trait::async_trait;
use oracle_core::codec;
use reqwest::Client;
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::debug;

use crate::error::InferenceError;

/// Path of the inference endpoint on the backend
pub const INFERENCE_PATH: &str = "/infer";

/// Hard limit on a single inference call
pub const DEFAULT_INFERENCE_TIMEOUT: Duration = Duration::from_secs(120);

/// Turns a prompt and configuration into an output string
#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn infer(&self, prompt: &str, config: Option<&JsonValue>)
    -> Result<String, InferenceError>;
}

/// HTTP implementation of [`InferenceClient`]
#[derive(Debug, Clone)]
pub struct HttpInferenceClient {
    base_url: String,
    client: Client,
}

impl HttpInferenceClient {
    /// Creates a client with the given request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, InferenceError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(base_url, client))
    }

    /// Creates a client around a preconfigured reqwest client
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl InferenceClient for HttpInferenceClient {
    async fn infer(
        &self,
        prompt: &str,
        config: Option<&JsonValue>,
    ) -> Result<String, InferenceError> {
        let url = format!("{}{}", self.base_url, INFERENCE_PATH);

        let mut query = vec![("prompt", prompt.to_string())];
        if let Some(config) = config {
            query.push(("config", codec::stringify(config)));
        }

        debug!("Requesting inference from {}", url);

        let response = self.client.get(&url).query(&query).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::Backend {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;
    use serde_json::json;
    use std::collections::HashMap;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn echo_router() -> Router {
        Router::new().route(
            INFERENCE_PATH,
            get(|Query(query): Query<HashMap<String, String>>| async move {
                format!(
                    "prompt={};config={}",
                    query.get("prompt").cloned().unwrap_or_default(),
                    query.get("config").cloned().unwrap_or_else(|| "-".to_string())
                )
            }),
        )
    }

    #[tokio::test]
    async fn test_infer_sends_prompt_and_config() {
        let base = serve(echo_router()).await;
        let client = HttpInferenceClient::new(base, DEFAULT_INFERENCE_TIMEOUT).unwrap();

        let output = client
            .infer("hello world", Some(&json!({"n_predict": 8})))
            .await
            .unwrap();

        assert_eq!(output, r#"prompt=hello world;config={"n_predict":8}"#);
    }

    #[tokio::test]
    async fn test_infer_without_config() {
        let base = serve(echo_router()).await;
        let client = HttpInferenceClient::new(base, DEFAULT_INFERENCE_TIMEOUT).unwrap();

        let output = client.infer("hi", None).await.unwrap();
        assert_eq!(output, "prompt=hi;config=-");
    }

    #[tokio::test]
    async fn test_backend_error_keeps_status_and_body() {
        let router = Router::new().route(
            INFERENCE_PATH,
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "model loading") }),
        );
        let base = serve(router).await;
        let client = HttpInferenceClient::new(base, DEFAULT_INFERENCE_TIMEOUT).unwrap();

        let err = client.infer("hi", None).await.unwrap_err();
        assert_eq!(err.status(), Some(503));
        match err {
            InferenceError::Backend { body, .. } => assert_eq!(body, "model loading"),
            other => panic!("expected backend error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_slow_backend_times_out() {
        let router = Router::new().route(
            INFERENCE_PATH,
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "too late"
            }),
        );
        let base = serve(router).await;
        let client = HttpInferenceClient::new(base, Duration::from_millis(100)).unwrap();

        let err = client.infer("hi", None).await.unwrap_err();
        assert!(err.status().is_none());
        match err {
            InferenceError::Timeout(source) => assert!(source.is_timeout()),
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        let client =
            HttpInferenceClient::new("http://127.0.0.1:1", DEFAULT_INFERENCE_TIMEOUT).unwrap();

        let err = client.infer("hi", None).await.unwrap_err();
        assert!(matches!(err, InferenceError::Transport(_)));
    }

    #[test]
    fn test_base_url_trimmed() {
        let client = HttpInferenceClient::with_client("http://backend:8000/", Client::new());
        assert_eq!(client.base_url(), "http://backend:8000");
    }
}
