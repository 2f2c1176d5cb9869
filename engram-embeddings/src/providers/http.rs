//! The production provider: HTTP POST with a bearer token, one vector
//! per call. The caller's deadline rides on the request timeout so a
//! slow provider is cancelled, not awaited.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;

use engram_core::config::EmbeddingConfig;
use engram_core::errors::EmbeddingError;
use engram_core::traits::{EmbeddingVector, IEmbeddingProvider};

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct WireResponse {
    data: Vec<WireEmbedding>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Deserialize)]
struct WireEmbedding {
    embedding: Vec<f32>,
}

pub struct HttpEmbeddingProvider {
    http: reqwest::blocking::Client,
    api_url: String,
    api_key: String,
    model: String,
    dimensions: usize,
}

impl HttpEmbeddingProvider {
    pub fn new(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let http = reqwest::blocking::Client::builder()
            .connect_timeout(Duration::from_secs(2))
            .build()
            .map_err(|e| EmbeddingError::Provider {
                status: None,
                message: format!("http client construction: {e}"),
            })?;
        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            dimensions: config.dimensions,
        })
    }
}

impl IEmbeddingProvider for HttpEmbeddingProvider {
    fn embed(&self, text: &str, deadline: Duration) -> Result<EmbeddingVector, EmbeddingError> {
        if self.api_key.is_empty() {
            return Err(EmbeddingError::MissingCredential);
        }

        let started = Instant::now();
        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .timeout(deadline)
            .json(&WireRequest {
                model: &self.model,
                input: text,
            })
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    EmbeddingError::Timeout {
                        deadline_ms: deadline.as_millis() as u64,
                    }
                } else {
                    EmbeddingError::Provider {
                        status: e.status().map(|s| s.as_u16()),
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(EmbeddingError::Provider {
                status: Some(status.as_u16()),
                message: body.chars().take(500).collect(),
            });
        }

        let body: WireResponse = response.json().map_err(|e| EmbeddingError::Provider {
            status: Some(status.as_u16()),
            message: format!("response decode: {e}"),
        })?;

        let vector = body
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| EmbeddingError::Provider {
                status: Some(status.as_u16()),
                message: "response carried no embedding".to_string(),
            })?;

        if vector.len() != self.dimensions {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimensions,
                actual: vector.len(),
            });
        }

        let elapsed_ms = started.elapsed().as_millis() as u64;
        debug!(elapsed_ms, dims = vector.len(), "embedding generated");

        Ok(EmbeddingVector {
            dimensions: vector.len(),
            vector,
            model: body.model.unwrap_or_else(|| self.model.clone()),
            elapsed_ms,
        })
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
