//! Embedding service client.
//!
//! - `Embedder`: the text -> vector capability the catalog and search rely on
//! - `OpenAiEmbedder`: blocking client for OpenAI-compatible `/embeddings` endpoints
//!
//! Every call sends exactly one input. There is no retry or batching across calls.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

/// Default embedding model identifier.
pub const DEFAULT_MODEL: &str = "text-embedding-3-small";

/// Default API root for the embedding service.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Error type for embedding operations
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("Embedding client initialization failed: {0}")]
    InitFailed(String),

    #[error("Cannot embed empty text")]
    EmptyInput,

    #[error("Embedding request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Embedding service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid embedding response: {0}")]
    InvalidResponse(String),
}

/// Converts text into a fixed-dimension vector.
pub trait Embedder: Send + Sync {
    /// Embed a single text. One call, one request.
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Model identifier used for logging.
    fn model(&self) -> &str;
}

/// Blocking embeddings client for OpenAI-compatible endpoints.
#[derive(Clone)]
pub struct OpenAiEmbedder {
    client: Client,
    endpoint: String,
    model: String,
}

impl OpenAiEmbedder {
    /// Build a client with bearer auth and a request timeout.
    pub fn new(
        api_key: &str,
        base_url: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, EmbeddingError> {
        if api_key.trim().is_empty() {
            return Err(EmbeddingError::InitFailed("missing API key".to_string()));
        }
        if model.trim().is_empty() {
            return Err(EmbeddingError::InitFailed("missing model name".to_string()));
        }

        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))
            .map_err(|e| EmbeddingError::InitFailed(format!("invalid API key: {}", e)))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| EmbeddingError::InitFailed(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint_url(base_url),
            model: model.to_string(),
        })
    }
}

impl Embedder for OpenAiEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }

        let request = EmbeddingRequest {
            model: &self.model,
            input: [text],
        };
        let resp = self.client.post(&self.endpoint).json(&request).send()?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(EmbeddingError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: EmbeddingResponse = resp
            .json()
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        first_embedding(parsed)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

fn endpoint_url(base_url: &str) -> String {
    format!("{}/embeddings", base_url.trim_end_matches('/'))
}

fn first_embedding(resp: EmbeddingResponse) -> Result<Vec<f32>, EmbeddingError> {
    let embedding = resp
        .data
        .into_iter()
        .min_by_key(|entry| entry.index)
        .map(|entry| entry.embedding)
        .ok_or_else(|| EmbeddingError::InvalidResponse("no embedding returned".to_string()))?;

    if embedding.is_empty() {
        return Err(EmbeddingError::InvalidResponse(
            "empty embedding vector".to_string(),
        ));
    }

    Ok(embedding)
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}
