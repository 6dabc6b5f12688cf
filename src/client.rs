//! HTTP client for the local OpenAI-compatible inference endpoint.
//!
//! The session engine talks to inference through the [`InferenceProvider`]
//! trait; [`Ollama`] is the production implementation, speaking the
//! `/v1/chat/completions` protocol that Ollama serves locally.

use std::pin::Pin;
use std::time::Duration;

use futures::stream::StreamExt;
use futures::Stream;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{header, Client as ReqwestClient, Response};
use url::Url;

use crate::error::{Error, Result};
use crate::observability::{CLIENT_REQUESTS, CLIENT_REQUEST_ERRORS};
use crate::sse::process_sse;
use crate::types::{ChatCompletion, ChatRequest};

/// Default base URL of the local endpoint.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434/v1/";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// A stream of incremental answer text fragments.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// The inference-call collaborator the session engine depends on.
///
/// The engine treats this as opaque: an ordered message set plus
/// generation parameters go in, a fragment stream (or a full answer)
/// comes out. Implementations own transport details and any retries.
#[async_trait::async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Starts a streaming chat completion and returns its fragments.
    async fn stream_chat(&self, request: ChatRequest) -> Result<FragmentStream>;

    /// Runs a chat completion to completion and returns the answer text.
    async fn complete(&self, request: ChatRequest) -> Result<String>;
}

/// Client for a local Ollama endpoint.
#[derive(Debug, Clone)]
pub struct Ollama {
    client: ReqwestClient,
    base_url: String,
    timeout: Duration,
}

impl Ollama {
    /// Creates a client for the default local endpoint.
    pub fn new() -> Result<Self> {
        Self::with_options(None, None)
    }

    /// Creates a client with a custom base URL and timeout.
    pub fn with_options(base_url: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut base_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Url::parse(&base_url)
            .map_err(|e| Error::url(format!("invalid endpoint URL '{base_url}': {e}"), Some(e)))?;

        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {}", e),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    /// Returns the configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Verifies that the endpoint is reachable.
    ///
    /// Called once at session start; an unreachable endpoint is fatal to
    /// the session, not to an individual turn.
    pub async fn check_connection(&self) -> Result<()> {
        let url = format!("{}models", self.base_url);
        let response = self.client.get(&url).send().await.map_err(|e| {
            Error::connection(
                format!(
                    "cannot reach {url}: {e}; make sure Ollama is running (ollama serve)"
                ),
                Some(Box::new(e)),
            )
        })?;
        if !response.status().is_success() {
            return Err(Error::api(
                response.status().as_u16(),
                format!("endpoint check against {url} failed"),
            ));
        }
        Ok(())
    }

    /// Create and return default headers for API requests.
    fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    fn map_send_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout(
                format!("Request timed out: {}", e),
                Some(self.timeout.as_secs_f64()),
            )
        } else if e.is_connect() {
            Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
        } else {
            Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
        }
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {}", e),
                    Some(Box::new(e)),
                );
            }
        };

        // Ollama error bodies are JSON like {"error": {"message": "..."}}
        // but plain text also occurs; fall back to the raw body.
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|value| {
                value
                    .pointer("/error/message")
                    .or_else(|| value.pointer("/error"))
                    .and_then(|m| m.as_str().map(String::from))
            })
            .unwrap_or(body);
        Error::api(status_code, message)
    }

    async fn post_chat(&self, request: &ChatRequest, streaming: bool) -> Result<Response> {
        let url = format!("{}chat/completions", self.base_url);

        let mut headers = self.default_headers();
        if streaming {
            headers.insert(
                header::ACCEPT,
                HeaderValue::from_static("text/event-stream"),
            );
        }

        CLIENT_REQUESTS.click();
        let response = self
            .client
            .post(&url)
            .headers(headers)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                CLIENT_REQUEST_ERRORS.click();
                self.map_send_error(e)
            })?;

        if !response.status().is_success() {
            CLIENT_REQUEST_ERRORS.click();
            return Err(Self::process_error_response(response).await);
        }
        Ok(response)
    }
}

#[async_trait::async_trait]
impl InferenceProvider for Ollama {
    async fn stream_chat(&self, mut request: ChatRequest) -> Result<FragmentStream> {
        request.stream = true;

        let response = self.post_chat(&request, true).await?;
        let chunks = process_sse(Box::pin(response.bytes_stream()));

        // Keep only chunks that carry text; role-only and terminal
        // chunks contribute nothing to the answer.
        let fragments = chunks.filter_map(|result| async move {
            match result {
                Ok(chunk) => chunk.fragment().map(|text| {
                    crate::observability::STREAM_FRAGMENTS.click();
                    Ok(text.to_string())
                }),
                Err(e) => {
                    crate::observability::STREAM_ERRORS.click();
                    Some(Err(e))
                }
            }
        });
        Ok(Box::pin(fragments))
    }

    async fn complete(&self, mut request: ChatRequest) -> Result<String> {
        request.stream = false;

        let response = self.post_chat(&request, false).await?;
        let completion = response.json::<ChatCompletion>().await.map_err(|e| {
            Error::serialization(
                format!("Failed to parse response: {}", e),
                Some(Box::new(e)),
            )
        })?;
        Ok(completion.text().unwrap_or_default().trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_normalizes_base_url() {
        let client = Ollama::with_options(
            Some("http://localhost:11434/v1".to_string()),
            Some(Duration::from_secs(30)),
        )
        .unwrap();
        assert_eq!(client.base_url(), "http://localhost:11434/v1/");
        assert_eq!(client.timeout, Duration::from_secs(30));
    }

    #[test]
    fn client_defaults() {
        let client = Ollama::new().unwrap();
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
        assert_eq!(client.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn invalid_url_is_rejected() {
        let result = Ollama::with_options(Some("not a url".to_string()), None);
        assert!(matches!(result, Err(Error::Url { .. })));
    }
}
