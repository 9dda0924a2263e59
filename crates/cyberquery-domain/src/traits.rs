//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.
//!
//! Both calls are synchronous and may block for a long time; async callers
//! are expected to run them on a blocking worker.

/// Trait for text generation backends
///
/// Implemented by the infrastructure layer (cyberquery-llm)
pub trait LlmProvider {
    /// Error type for generation
    type Error;

    /// Generate a text completion for the prompt
    fn generate(&self, prompt: &str) -> Result<String, Self::Error>;

    /// Name of the model behind this provider
    fn model_name(&self) -> &str;
}

/// Trait for text embedding models
///
/// Implemented by the infrastructure layer (cyberquery-rag)
pub trait EmbeddingModel {
    /// Error type for embedding
    type Error;

    /// Generate an embedding vector for the given text
    fn embed(&self, text: &str) -> Result<Vec<f32>, Self::Error>;

    /// Dimension of the vectors produced by this model
    fn dimension(&self) -> usize;

    /// Embed several texts, stopping at the first failure
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, Self::Error> {
        texts.iter().map(|text| self.embed(text)).collect()
    }
}
