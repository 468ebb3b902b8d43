//! Gemini embedding client.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{Value, json};
use shortlist_core::IndexServiceError;
use shortlist_core::config::LlmConfig;
use shortlist_search::Embedder;
use tracing::debug;

use crate::error::LlmError;

/// Largest request `batchEmbedContents` accepts.
const BATCH_LIMIT: usize = 100;

const TASK_TYPE: &str = "RETRIEVAL_DOCUMENT";

#[derive(Debug, Deserialize)]
struct Values {
    #[serde(default)]
    values: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct SingleResponse {
    embedding: Values,
}

#[derive(Debug, Deserialize)]
struct BatchResponse {
    #[serde(default)]
    embeddings: Vec<Values>,
}

/// Embeds text with a Gemini embedding model at a fixed output width.
pub struct GeminiEmbedder {
    agent: ureq::Agent,
    api_key: String,
    base_url: String,
    model: String,
    dimension: usize,
}

impl std::fmt::Debug for GeminiEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiEmbedder")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("dimension", &self.dimension)
            .finish_non_exhaustive()
    }
}

impl GeminiEmbedder {
    #[must_use]
    pub fn new(api_key: impl Into<String>, config: &LlmConfig, dimension: usize) -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build(),
            api_key: api_key.into(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.embedding_model.clone(),
            dimension,
        }
    }

    fn url(&self, method: &str) -> String {
        format!("{}/models/{}:{method}", self.base_url, self.model)
    }

    fn post(&self, method: &str, body: &Value) -> Result<ureq::Response, IndexServiceError> {
        self.agent
            .post(&self.url(method))
            .set("x-goog-api-key", &self.api_key)
            .send_json(body)
            .map_err(|err| unreachable_service(&LlmError::from(err)))
    }

    fn check(&self, values: Vec<f32>) -> Result<Vec<f32>, IndexServiceError> {
        if values.len() == self.dimension {
            Ok(values)
        } else {
            Err(IndexServiceError::DimensionMismatch {
                expected: self.dimension,
                actual: values.len(),
            })
        }
    }
}

fn unreachable_service(err: &LlmError) -> IndexServiceError {
    IndexServiceError::Unreachable(format!("embedding request failed: {err}"))
}

fn decode<T: serde::de::DeserializeOwned>(response: ureq::Response) -> Result<T, IndexServiceError> {
    response
        .into_json()
        .map_err(|err| unreachable_service(&LlmError::MalformedResponse(err.to_string())))
}

fn content_request(model: &str, text: &str, dimension: usize) -> Value {
    json!({
        "model": format!("models/{model}"),
        "content": { "parts": [{ "text": text }] },
        "taskType": TASK_TYPE,
        "outputDimensionality": dimension,
    })
}

fn batch_request(model: &str, texts: &[&str], dimension: usize) -> Value {
    let requests: Vec<Value> = texts
        .iter()
        .map(|text| content_request(model, text, dimension))
        .collect();
    json!({ "requests": requests })
}

impl Embedder for GeminiEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, IndexServiceError> {
        let body = content_request(&self.model, text, self.dimension);
        let response: SingleResponse = decode(self.post("embedContent", &body)?)?;
        self.check(response.embedding.values)
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, IndexServiceError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(BATCH_LIMIT) {
            debug!(model = %self.model, batch = chunk.len(), "embedding batch");
            let body = batch_request(&self.model, chunk, self.dimension);
            let response: BatchResponse = decode(self.post("batchEmbedContents", &body)?)?;
            if response.embeddings.len() != chunk.len() {
                return Err(IndexServiceError::Unreachable(format!(
                    "embedding service returned {} vectors for {} texts",
                    response.embeddings.len(),
                    chunk.len()
                )));
            }
            for embedding in response.embeddings {
                vectors.push(self.check(embedding.values)?);
            }
        }
        Ok(vectors)
    }
}
