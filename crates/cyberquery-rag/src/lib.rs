//! CyberQuery Retrieval Layer
//!
//! Indexes a small corpus of tool documentation and finds excerpts relevant
//! to a query, so prompts can be grounded in real tool syntax.
//!
//! # Architecture
//!
//! ```text
//! rag_data/*.txt + tools.json
//!        │
//!   CorpusLoader ──► Chunker ──► EmbeddingModel ──► VectorIndex (HNSW)
//!                                                        │
//!                          SemanticIndex::query ◄────────┘
//!                                  │
//!                          format_context ──► context block
//! ```
//!
//! Retrieval is best-effort: a missing corpus, a malformed catalog or a
//! failing embedding backend all degrade to "no context" and are logged,
//! never returned as errors.
//!
//! # Examples
//!
//! ```no_run
//! use cyberquery_rag::{format_context, MockEmbeddingModel, RagConfig, SemanticIndex};
//!
//! let config = RagConfig::default();
//! let index = SemanticIndex::from_config(&config, MockEmbeddingModel::new(256)).unwrap();
//! index.build();
//!
//! let results = index.query("scan open ports", config.top_k);
//! println!("{}", format_context(&results));
//! ```

#![warn(missing_docs)]

pub mod chunking;
pub mod config;
pub mod context;
pub mod corpus;
pub mod embedding;
pub mod index;
pub mod vector_index;

use thiserror::Error;

pub use chunking::Chunker;
pub use config::RagConfig;
pub use context::{format_context, CONTEXT_SEPARATOR};
pub use corpus::{CatalogEntry, CorpusLoader, ToolCatalog};
pub use embedding::{cosine_similarity, EmbeddingError, MockEmbeddingModel, OllamaEmbeddingModel};
pub use index::{IndexEntry, IndexState, RankedResult, ScoredChunk, SemanticIndex};
pub use vector_index::{VectorIndex, VectorIndexError};

/// Errors raised while setting up the retrieval layer
///
/// Runtime retrieval failures are absorbed; only invalid configuration is
/// reported through this type.
#[derive(Error, Debug)]
pub enum RagError {
    /// Invalid retrieval configuration
    #[error("Configuration error: {0}")]
    Config(String),
}
