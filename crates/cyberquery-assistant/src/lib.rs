//! CyberQuery Assistant
//!
//! Answers security tasks with a generative model, grounded in a corpus of
//! tool documentation.
//!
//! # Architecture
//!
//! ```text
//! Task → Semantic Index → Context → Prompt Template → LLM → Recovery → Answer
//! ```
//!
//! # Key Features
//!
//! - **Retrieval**: reference chunks for the task are spliced into the prompt
//! - **Safe templating**: retrieved text is brace-escaped before parsing
//! - **Recovery**: near-miss JSON is repaired, validated and defaulted
//! - **Typed answers**: commands, code, explanations and exploit searches
//! - **Chat**: free-form replies with conversation history
//!
//! # Example Usage
//!
//! ```no_run
//! use cyberquery_assistant::{Assistant, AssistantConfig, ResponseFormatter};
//! use cyberquery_llm::OllamaProvider;
//! use cyberquery_rag::{OllamaEmbeddingModel, RagConfig, SemanticIndex};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let llm = OllamaProvider::default_endpoint("llama3.2")?;
//! let embedder = OllamaEmbeddingModel::new("http://localhost:11434", "nomic-embed-text", 768)?;
//! let index = Arc::new(SemanticIndex::from_config(&RagConfig::default(), embedder)?);
//!
//! let assistant = Assistant::new(llm, index, AssistantConfig::default())?;
//! let answer = assistant.generate_code("crack an md5 hash with a wordlist").await?;
//!
//! println!("{}", ResponseFormatter::format_code_generation(answer.response()));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod assistant;
mod config;
mod error;
mod formatters;
mod prompt;
mod template;
mod types;


pub use assistant::{render_history, Assistant};
pub use config::AssistantConfig;
pub use error::AssistantError;
pub use formatters::ResponseFormatter;
pub use prompt::{rag_block, PromptLibrary};
pub use template::{escape_braces, PromptTemplate, TemplateError};
pub use types::{
    Answer, ChatMessage, CodeExplanationResponse, CodeGenerationResponse,
    CommandGenerationResponse, Exploit, ExploitSearchResponse, TypedResponse,
};

/// Re-exported so callers can match on raw outcomes
pub use cyberquery_recovery::ValidationOutcome;
