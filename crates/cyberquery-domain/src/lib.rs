//! CyberQuery Domain Layer
//!
//! Core types and trait interfaces shared by every other crate in the
//! workspace. Like any clean domain layer it carries no third-party
//! dependencies: infrastructure (model backends, vector index, HTTP) lives in
//! the outer crates and plugs in through the traits defined here.
//!
//! ## Key Concepts
//!
//! - **DocumentRecord**: One reference file from the corpus plus its tool metadata
//! - **Chunk**: A bounded, overlapping window of a document used as a retrieval unit
//! - **OutputType**: The structured answer shapes the assistant produces
//!   (commands, code, explanations, exploit listings) and their required fields
//! - **Ports**: `LlmProvider` for text generation, `EmbeddingModel` for vectors

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod output;
pub mod traits;

// Re-exports for convenience
pub use document::{Chunk, DocumentId, DocumentRecord, ToolMetadata, UNKNOWN_CATEGORY};
pub use output::{FieldKind, FieldSpec, OutputType, CHAT_TOPIC};
pub use traits::{EmbeddingModel, LlmProvider};
