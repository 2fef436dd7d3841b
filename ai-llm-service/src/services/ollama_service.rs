//! Lightweight Ollama service for text generation and embeddings.
//!
//! This module implements a thin client for the local Ollama API:
//! - `POST {endpoint}/api/generate`: synchronous text generation (`stream=false`)
//! - `POST {endpoint}/api/embeddings`: embeddings retrieval
//!
//! # Examples
//!
//! ```no_run
//! use ai_llm_service::{LlmModelConfig, LlmProvider, OllamaService};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = LlmModelConfig {
//!     provider: LlmProvider::Ollama,
//!     model: "llama3.2:3b".into(),
//!     endpoint: "http://localhost:11434".into(),
//!     max_tokens: Some(150),
//!     temperature: Some(0.2),
//!     top_p: Some(0.8),
//!     num_ctx: Some(2048),
//!     repeat_penalty: Some(1.1),
//!     stop: vec!["\n\nFrage:".into(), "Kontext:".into()],
//!     timeout_secs: Some(60),
//! };
//!
//! let svc = OllamaService::new(cfg)?;
//! let text = svc.generate("Was regelt Art. 15a ArG?").await?;
//! println!("{text}");
//! # Ok(()) }
//! ```

use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::config::llm_model_config::LlmModelConfig;
use crate::error_handler::make_snippet;

/// Errors produced by [`OllamaService`].
#[derive(Debug, Error)]
pub enum OllamaError {
    /// Invalid endpoint (empty or missing http/https).
    #[error("[AI LLM Service] invalid Ollama endpoint: {0}")]
    InvalidEndpoint(String),

    /// Transport/HTTP client error (connection refused, DNS, TLS...).
    #[error("[AI LLM Service] transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The request did not complete within the configured timeout.
    #[error("[AI LLM Service] Ollama request timed out after {0:?}")]
    Timeout(Duration),

    /// Non-successful HTTP status from upstream.
    #[error("[AI LLM Service] unexpected HTTP status {status} from {url}: {snippet}")]
    HttpStatus {
        /// Numeric HTTP status code.
        status: StatusCode,
        /// Request URL.
        url: String,
        /// Optional short snippet of the response body.
        snippet: String,
    },

    /// Unexpected/invalid JSON response.
    #[error("[AI LLM Service] failed to decode response: {0}")]
    Decode(String),
}

/// Result alias for Ollama operations.
pub type Result<T> = std::result::Result<T, OllamaError>;

/// Thin client for Ollama.
///
/// Reuses one HTTP client with the configured timeout.
#[derive(Debug)]
pub struct OllamaService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    timeout: Duration,
    url_generate: String,
    url_embeddings: String,
}

impl OllamaService {
    /// Creates a new [`OllamaService`] from the given config.
    ///
    /// # Errors
    /// - [`OllamaError::InvalidEndpoint`] if `cfg.endpoint` is invalid
    /// - [`OllamaError::Transport`] if HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self> {
        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(OllamaError::InvalidEndpoint(cfg.endpoint));
        }

        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(60));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()?;

        let base = endpoint.trim_end_matches('/').to_string();
        let url_generate = format!("{base}/api/generate");
        let url_embeddings = format!("{base}/api/embeddings");

        Ok(Self {
            client,
            cfg,
            timeout,
            url_generate,
            url_embeddings,
        })
    }

    /// The profile this client was built from.
    pub fn config(&self) -> &LlmModelConfig {
        &self.cfg
    }

    /// Performs a **non-streaming** generation request via `/api/generate`.
    ///
    /// Mapped options: `num_predict`, `temperature`, `top_p`, `num_ctx`,
    /// `repeat_penalty` and `stop`, each only when set in the config.
    ///
    /// # Errors
    /// - [`OllamaError::Timeout`] when the configured timeout elapses
    /// - [`OllamaError::HttpStatus`] for non-2xx responses
    /// - [`OllamaError::Transport`] for client errors
    /// - [`OllamaError::Decode`] if response cannot be parsed
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let body = GenerateRequest::from_cfg(&self.cfg, prompt);

        debug!("POST {}", self.url_generate);
        let resp = self
            .client
            .post(&self.url_generate)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        let resp = self.ensure_success(resp, &self.url_generate).await?;

        let out: GenerateResponse = resp.json().await.map_err(|e| {
            if e.is_timeout() {
                OllamaError::Timeout(self.timeout)
            } else {
                OllamaError::Decode(format!("serde error: {e}; ensure `stream=false` is used"))
            }
        })?;

        debug!(chars = out.response.len(), "generation finished");
        Ok(out.response)
    }

    /// Retrieves embeddings via `/api/embeddings`.
    ///
    /// # Errors
    /// - [`OllamaError::Timeout`] when the configured timeout elapses
    /// - [`OllamaError::HttpStatus`] for non-2xx responses
    /// - [`OllamaError::Transport`] for client errors
    /// - [`OllamaError::Decode`] if response cannot be parsed or is empty
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    pub async fn embeddings(&self, input: &str) -> Result<Vec<f32>> {
        let body = EmbeddingsRequest {
            model: &self.cfg.model,
            prompt: input,
        };

        debug!("POST {}", self.url_embeddings);
        let resp = self
            .client
            .post(&self.url_embeddings)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        let resp = self.ensure_success(resp, &self.url_embeddings).await?;

        let out: EmbeddingsResponse = resp.json().await.map_err(|e| {
            OllamaError::Decode(format!(
                "serde error: {e}; expected `{{ embedding: number[] }}`"
            ))
        })?;

        if out.embedding.is_empty() {
            return Err(OllamaError::Decode("empty embedding vector".into()));
        }
        Ok(out.embedding)
    }

    fn map_transport(&self, e: reqwest::Error) -> OllamaError {
        if e.is_timeout() {
            warn!(timeout_secs = self.timeout.as_secs(), "Ollama request timed out");
            OllamaError::Timeout(self.timeout)
        } else {
            OllamaError::Transport(e)
        }
    }

    async fn ensure_success(&self, resp: reqwest::Response, url: &str) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        let snippet = make_snippet(&text);
        warn!(%status, %url, %snippet, "Ollama returned non-success status");
        Err(OllamaError::HttpStatus {
            status,
            url: url.to_string(),
            snippet,
        })
    }
}

/* ==========================
HTTP payloads & options
========================== */

/// Request body for `/api/generate` (non-streaming).
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerateOptions<'a>>,
}

impl<'a> GenerateRequest<'a> {
    /// Builds a request from config and prompt.
    fn from_cfg(cfg: &'a LlmModelConfig, prompt: &'a str) -> Self {
        let options = GenerateOptions {
            temperature: cfg.temperature,
            top_p: cfg.top_p,
            num_predict: cfg.max_tokens,
            num_ctx: cfg.num_ctx,
            repeat_penalty: cfg.repeat_penalty,
            stop: &cfg.stop,
        };

        Self {
            model: &cfg.model,
            prompt,
            stream: false,
            options: Some(options),
        }
    }
}

/// Subset of Ollama `options`.
#[derive(Debug, Serialize)]
struct GenerateOptions<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_ctx: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    repeat_penalty: Option<f32>,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    stop: &'a [String],
}

/// Response body for `/api/generate`.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Request body for `/api/embeddings`.
#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

/// Response body for `/api/embeddings`.
#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::llm_provider::LlmProvider;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    fn cfg(endpoint: String, timeout_secs: u64) -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::Ollama,
            model: "llama3.2:3b".into(),
            endpoint,
            max_tokens: Some(150),
            temperature: Some(0.2),
            top_p: Some(0.8),
            num_ctx: Some(2048),
            repeat_penalty: Some(1.1),
            stop: vec!["\n\nFrage:".into()],
            timeout_secs: Some(timeout_secs),
        }
    }

    /// Reads one HTTP request (headers plus `Content-Length` body).
    async fn read_request(sock: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = sock.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some(pos) = text.find("\r\n\r\n") {
                let len = text[..pos]
                    .lines()
                    .find_map(|l| {
                        let (k, v) = l.split_once(':')?;
                        k.eq_ignore_ascii_case("content-length")
                            .then(|| v.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= pos + 4 + len {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    /// Serves exactly one canned response and returns the captured request.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let req = read_request(&mut sock).await;
            let resp = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            sock.write_all(resp.as_bytes()).await.unwrap();
            sock.shutdown().await.ok();
            req
        });
        (format!("http://{addr}"), handle)
    }

    #[test]
    fn rejects_invalid_endpoint() {
        let err = OllamaService::new(cfg("localhost:11434".into(), 1)).unwrap_err();
        assert!(matches!(err, OllamaError::InvalidEndpoint(_)));
    }

    #[tokio::test]
    async fn generate_returns_response_and_sends_options() {
        let (url, handle) = serve_once("200 OK", r#"{"response":"Die Ruhezeit beträgt 11 Stunden."}"#).await;
        let svc = OllamaService::new(cfg(url, 5)).unwrap();

        let text = svc.generate("Frage").await.unwrap();
        assert_eq!(text, "Die Ruhezeit beträgt 11 Stunden.");

        let req = handle.await.unwrap();
        assert!(req.starts_with("POST /api/generate"));
        assert!(req.contains(r#""stream":false"#));
        assert!(req.contains(r#""num_predict":150"#));
        assert!(req.contains(r#""num_ctx":2048"#));
    }

    #[tokio::test]
    async fn non_success_status_maps_to_http_status() {
        let (url, _handle) = serve_once("500 Internal Server Error", r#"{"error":"boom"}"#).await;
        let svc = OllamaService::new(cfg(url, 5)).unwrap();

        match svc.generate("Frage").await {
            Err(OllamaError::HttpStatus { status, snippet, .. }) => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert!(snippet.contains("boom"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn silent_server_maps_to_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_sock, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let svc = OllamaService::new(cfg(format!("http://{addr}"), 1)).unwrap();
        let err = svc.generate("Frage").await.unwrap_err();
        assert!(matches!(err, OllamaError::Timeout(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn embeddings_send_prompt_field() {
        let (url, handle) = serve_once("200 OK", r#"{"embedding":[0.1,0.2,0.3]}"#).await;
        let svc = OllamaService::new(cfg(url, 5)).unwrap();

        let v = svc.embeddings("Ruhezeit").await.unwrap();
        assert_eq!(v.len(), 3);

        let req = handle.await.unwrap();
        assert!(req.starts_with("POST /api/embeddings"));
        assert!(req.contains(r#""prompt":"Ruhezeit""#));
    }

    #[tokio::test]
    async fn empty_embedding_is_decode_error() {
        let (url, _handle) = serve_once("200 OK", r#"{"embedding":[]}"#).await;
        let svc = OllamaService::new(cfg(url, 5)).unwrap();
        assert!(matches!(
            svc.embeddings("x").await,
            Err(OllamaError::Decode(_))
        ));
    }
}
