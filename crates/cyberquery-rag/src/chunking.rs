//! Sliding-window chunking of reference documents
//!
//! Windows are measured in characters, never bytes, so a chunk boundary can
//! not split a multi-byte code point.

use crate::config::RagConfig;
use crate::RagError;
use cyberquery_domain::{Chunk, DocumentRecord};

/// Default chunk window size (characters)
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Default overlap between consecutive windows (characters)
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Splits documents into overlapping fixed-size windows
///
/// # Examples
///
/// ```
/// use cyberquery_domain::{DocumentId, DocumentRecord, ToolMetadata};
/// use cyberquery_rag::Chunker;
///
/// let doc = DocumentRecord::new(
///     DocumentId::new("nmap_help.txt"),
///     "abcdefghij",
///     ToolMetadata::unknown("nmap"),
/// );
/// let chunker = Chunker::new(4, 1).unwrap();
/// let chunks = chunker.chunk_document(&doc);
///
/// let texts: Vec<&str> = chunks.iter().map(|c| c.text()).collect();
/// assert_eq!(texts, vec!["abcd", "defg", "ghij"]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    chunk_size: usize,
    overlap: usize,
}

impl Chunker {
    /// Create a chunker; `overlap` must be smaller than `chunk_size`
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self, RagError> {
        if chunk_size == 0 {
            return Err(RagError::Config("chunk_size must be greater than 0".to_string()));
        }
        if overlap >= chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                overlap, chunk_size
            )));
        }
        Ok(Self { chunk_size, overlap })
    }

    /// Create a chunker from retrieval configuration
    pub fn from_config(config: &RagConfig) -> Result<Self, RagError> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Window size in characters
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Overlap in characters
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    fn step(&self) -> usize {
        self.chunk_size - self.overlap
    }

    /// Split a single document, in text order
    ///
    /// A document no longer than one window yields exactly one chunk holding
    /// the whole text (an empty document yields one empty chunk).
    pub fn chunk_document(&self, document: &DocumentRecord) -> Vec<Chunk> {
        let text = document.raw_text();

        // Byte offset of every char boundary, plus the end of the text
        let mut boundaries: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        boundaries.push(text.len());
        let total = boundaries.len() - 1;

        let mut chunks = Vec::with_capacity(total / self.step() + 1);
        let mut start = 0;
        loop {
            let end = (start + self.chunk_size).min(total);
            let slice = &text[boundaries[start]..boundaries[end]];
            chunks.push(Chunk::new(document, slice, start));

            if end == total {
                break;
            }
            start += self.step();
        }
        chunks
    }

    /// Split every document, preserving document order
    pub fn chunk_documents(&self, documents: &[DocumentRecord]) -> Vec<Chunk> {
        documents
            .iter()
            .flat_map(|doc| self.chunk_document(doc))
            .collect()
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}
