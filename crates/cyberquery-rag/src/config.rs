//! Configuration for the retrieval layer

use crate::RagError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for corpus loading, chunking and retrieval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Directory holding the `*.txt` reference files
    pub data_dir: PathBuf,

    /// File name of the metadata catalog inside `data_dir`
    pub catalog_file: String,

    /// Chunk window size (characters)
    pub chunk_size: usize,

    /// Overlap between consecutive chunks (characters)
    pub chunk_overlap: usize,

    /// Number of chunks retrieved per query
    pub top_k: usize,

    /// Expected embedding dimension of the configured model
    pub embedding_dimension: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("rag_data"),
            catalog_file: "tools.json".to_string(),
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 3,
            embedding_dimension: 768,
        }
    }
}

impl RagConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), RagError> {
        if self.chunk_size == 0 {
            return Err(RagError::Config("chunk_size must be greater than 0".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.top_k == 0 {
            return Err(RagError::Config("top_k must be greater than 0".to_string()));
        }
        if self.embedding_dimension == 0 {
            return Err(RagError::Config(
                "embedding_dimension must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Full path of the metadata catalog
    pub fn catalog_path(&self) -> PathBuf {
        self.data_dir.join(&self.catalog_file)
    }

    /// Anchor a relative `data_dir` under `root`
    pub fn with_root(mut self, root: &Path) -> Self {
        if self.data_dir.is_relative() {
            self.data_dir = root.join(&self.data_dir);
        }
        self
    }
}
