//! Embedding Models for Text Vectorization
//!
//! Implementations of the [`EmbeddingModel`] port used by the semantic index.
//!
//! # Models
//!
//! - **MockEmbeddingModel**: Deterministic bag-of-words feature hashing, for
//!   tests and offline runs. Texts sharing words land close together.
//! - **OllamaEmbeddingModel**: Calls the Ollama `/api/embed` endpoint.
//!
//! # Examples
//!
//! ```rust
//! use cyberquery_domain::EmbeddingModel;
//! use cyberquery_rag::MockEmbeddingModel;
//!
//! let model = MockEmbeddingModel::new(384);
//! let embedding = model.embed("scan open ports").unwrap();
//! assert_eq!(embedding.len(), 384);
//!
//! // Same text always produces same embedding
//! assert_eq!(embedding, model.embed("scan open ports").unwrap());
//! ```

use cyberquery_domain::EmbeddingModel;
use cyberquery_llm::BlockingBridge;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during embedding generation
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// Invalid input text
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Model inference error
    #[error("Model inference failed: {0}")]
    InferenceFailed(String),

    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),
}

/// Mock embedding model using feature hashing
///
/// Every lowercase alphanumeric token is hashed to a bucket and a sign, and
/// the bucket counts are normalized to unit length. The embeddings are:
///
/// - **Deterministic**: Same text always produces same embedding
/// - **Normalized**: All vectors have unit length (for cosine similarity)
/// - **Lexical**: Texts sharing vocabulary have positive similarity
#[derive(Debug, Clone)]
pub struct MockEmbeddingModel {
    dimension: usize,
    fail: bool,
}

impl MockEmbeddingModel {
    /// Create a new mock embedding model
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
            fail: false,
        }
    }

    /// Create a model whose every call fails, for exercising degraded paths
    pub fn failing(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
            fail: true,
        }
    }

    fn bucket(&self, token: &str) -> (usize, f32) {
        let mut hasher = DefaultHasher::new();
        token.hash(&mut hasher);
        let hash = hasher.finish();
        let index = (hash % self.dimension as u64) as usize;
        let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
        (index, sign)
    }
}

impl EmbeddingModel for MockEmbeddingModel {
    type Error = EmbeddingError;

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if self.fail {
            return Err(EmbeddingError::InferenceFailed(
                "Mock embedding failure".to_string(),
            ));
        }
        if text.trim().is_empty() {
            return Err(EmbeddingError::InvalidInput(
                "Empty text cannot be embedded".to_string(),
            ));
        }

        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();

        let mut embedding = vec![0.0f32; self.dimension];
        if tokens.is_empty() {
            // Punctuation-only text still gets a stable vector
            let (index, sign) = self.bucket(&lowered);
            embedding[index] += sign;
        }
        for token in tokens {
            let (index, sign) = self.bucket(token);
            embedding[index] += sign;
        }

        normalize(&mut embedding);
        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

fn normalize(embedding: &mut [f32]) {
    let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if magnitude > 0.0 {
        for value in embedding.iter_mut() {
            *value /= magnitude;
        }
    }
}

/// Request body for the Ollama embed API
#[derive(Serialize)]
struct OllamaEmbedRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

/// Response from the Ollama embed API
#[derive(Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Embedding model backed by a local Ollama server
pub struct OllamaEmbeddingModel {
    endpoint: String,
    model: String,
    client: reqwest::Client,
    configured_dimension: usize,
    observed_dimension: OnceLock<usize>,
    bridge: BlockingBridge,
}

impl OllamaEmbeddingModel {
    /// Create a new Ollama embedding model
    ///
    /// `dimension` is reported until the first successful call reveals the
    /// model's real output size.
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        dimension: usize,
    ) -> Result<Self, EmbeddingError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| EmbeddingError::Communication(format!("Failed to build HTTP client: {}", e)))?;

        let bridge = BlockingBridge::new()
            .map_err(|e| EmbeddingError::InferenceFailed(format!("Failed to start runtime: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client,
            configured_dimension: dimension,
            observed_dimension: OnceLock::new(),
            bridge,
        })
    }

    /// Embedding model name
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Embed a batch of texts with one API call
    pub async fn embed_batch_async(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/api/embed", self.endpoint);
        let request_body = OllamaEmbedRequest {
            model: &self.model,
            input: texts,
        };

        let response = self
            .client
            .post(&url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| EmbeddingError::Communication(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(EmbeddingError::Communication(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let parsed = response
            .json::<OllamaEmbedResponse>()
            .await
            .map_err(|e| EmbeddingError::InferenceFailed(format!("Failed to parse response: {}", e)))?;

        if parsed.embeddings.len() != texts.len() {
            return Err(EmbeddingError::InferenceFailed(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                parsed.embeddings.len()
            )));
        }

        if let Some(first) = parsed.embeddings.first() {
            let dimension = *self.observed_dimension.get_or_init(|| first.len());
            if parsed.embeddings.iter().any(|e| e.len() != dimension) {
                return Err(EmbeddingError::InferenceFailed(
                    "Inconsistent embedding dimensions".to_string(),
                ));
            }
        }

        debug!(model = %self.model, inputs = texts.len(), "Embedded batch");
        Ok(parsed.embeddings)
    }
}

impl EmbeddingModel for OllamaEmbeddingModel {
    type Error = EmbeddingError;

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::InvalidInput(
                "Empty text cannot be embedded".to_string(),
            ));
        }
        let mut batch = self.embed_batch(&[text])?;
        batch
            .pop()
            .ok_or_else(|| EmbeddingError::InferenceFailed("Empty embedding response".to_string()))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.bridge.block_on(self.embed_batch_async(texts))
    }

    fn dimension(&self) -> usize {
        self.observed_dimension
            .get()
            .copied()
            .unwrap_or(self.configured_dimension)
    }
}

/// Calculate cosine similarity between two embedding vectors
///
/// Returns a value in [-1, 1]. Vectors of different lengths, or with zero
/// magnitude, have similarity 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeat_calls_agree() {
        let model = MockEmbeddingModel::new(96);
        let command = "nmap -sS -p 1-1000 192.168.1.1";
        assert_eq!(model.embed(command).unwrap(), model.embed(command).unwrap());
        assert_eq!(model.embed(command).unwrap().len(), 96);
        assert_eq!(model.dimension(), 96);
    }

    #[test]
    fn test_vectors_have_unit_length() {
        let model = MockEmbeddingModel::new(200);
        for text in ["hydra -l admin", "a", "sqlmap --dbs --batch"] {
            let norm = dot(&model.embed(text).unwrap());
            assert!((norm - 1.0).abs() < 1e-4, "{text} has squared norm {norm}");
        }
    }

    fn dot(v: &[f32]) -> f32 {
        v.iter().map(|x| x * x).sum()
    }

    #[test]
    fn test_zero_dimension_is_clamped() {
        assert_eq!(MockEmbeddingModel::new(0).dimension(), 1);
    }

    #[test]
    fn test_mock_embedding_is_case_insensitive() {
        let model = MockEmbeddingModel::new(256);
        assert_eq!(model.embed("Port Scan").unwrap(), model.embed("port scan").unwrap());
    }

    #[test]
    fn test_shared_vocabulary_is_closer() {
        let model = MockEmbeddingModel::new(512);

        let query = model.embed("crack password hashes").unwrap();
        let related = model.embed("john can crack password hashes offline").unwrap();
        let unrelated = model.embed("enumerate subdomains via dns").unwrap();

        assert!(cosine_similarity(&query, &related) > cosine_similarity(&query, &unrelated));
    }

    #[test]
    fn test_punctuation_only_text_embeds() {
        let model = MockEmbeddingModel::new(64);
        assert!((dot(&model.embed("{}").unwrap()) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_blank_text_is_invalid_input() {
        let model = MockEmbeddingModel::new(16);
        assert!(matches!(model.embed("   "), Err(EmbeddingError::InvalidInput(_))));
        assert!(matches!(model.embed(""), Err(EmbeddingError::InvalidInput(_))));
    }

    #[test]
    fn test_failing_model() {
        let model = MockEmbeddingModel::failing(32);
        assert!(matches!(model.embed("anything"), Err(EmbeddingError::InferenceFailed(_))));
        assert!(model.embed_batch(&["a", "b"]).is_err());
    }

    #[test]
    fn test_default_batch_embeds_each_text() {
        let model = MockEmbeddingModel::new(32);
        let batch = model.embed_batch(&["alpha", "beta"]).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], model.embed("alpha").unwrap());
    }

    #[test]
    fn test_cosine_similarity_bounds() {
        let axis_x = [1.0, 0.0, 0.0];
        let axis_y = [0.0, 1.0, 0.0];
        let scaled = [3.0, 0.0, 0.0];
        assert!((cosine_similarity(&axis_x, &scaled) - 1.0).abs() < 1e-4);
        assert!(cosine_similarity(&axis_x, &axis_y).abs() < 1e-4);
        assert!((cosine_similarity(&axis_x, &[-2.0, 0.0, 0.0]) + 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_cosine_similarity_zero_vector() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_cosine_similarity_length_mismatch() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_ollama_model_reports_configured_dimension() {
        let model = OllamaEmbeddingModel::new("http://localhost:11434/", "nomic-embed-text", 768).unwrap();
        assert_eq!(model.dimension(), 768);
        assert_eq!(model.model(), "nomic-embed-text");
        assert_eq!(model.endpoint, "http://localhost:11434");
    }

    #[test]
    fn test_ollama_model_unreachable_is_communication_error() {
        // Nothing listens on port 1
        let model = OllamaEmbeddingModel::new("http://127.0.0.1:1", "nomic-embed-text", 768).unwrap();
        assert!(matches!(model.embed("scan ports"), Err(EmbeddingError::Communication(_))));
    }
}
