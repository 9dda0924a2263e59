//! Reference documents and the chunks cut from them
//!
//! A [`DocumentRecord`] is created once per corpus file and never mutated.
//! Its [`ToolMetadata`] sits behind an `Arc` so every [`Chunk`] derived from
//! the document shares the same metadata instead of copying it.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Category assigned to documents that have no catalog entry
pub const UNKNOWN_CATEGORY: &str = "unknown";

/// Identifier of a document in the corpus (its file name)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentId(String);

impl DocumentId {
    /// Create a new document identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Descriptive metadata about the tool a document covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolMetadata {
    /// Logical tool name (e.g., "nmap")
    pub tool_name: String,

    /// Broad category (e.g., "reconnaissance")
    pub category: String,

    /// Narrower category (e.g., "network_scanning")
    pub subcategory: String,

    /// One-line description of the tool
    pub description: String,

    /// Free-form tags
    pub tags: BTreeSet<String>,

    /// Typical use cases
    pub use_cases: BTreeSet<String>,

    /// Set when the metadata came from a catalog entry
    pub catalogued: bool,
}

impl ToolMetadata {
    /// Metadata for a document with no catalog entry
    ///
    /// # Examples
    ///
    /// ```
    /// use cyberquery_domain::{ToolMetadata, UNKNOWN_CATEGORY};
    ///
    /// let metadata = ToolMetadata::unknown("hydra");
    /// assert_eq!(metadata.category, UNKNOWN_CATEGORY);
    /// assert!(metadata.tags.is_empty());
    /// ```
    pub fn unknown(tool_name: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            category: UNKNOWN_CATEGORY.to_string(),
            subcategory: String::new(),
            description: String::new(),
            tags: BTreeSet::new(),
            use_cases: BTreeSet::new(),
            catalogued: false,
        }
    }

    /// Whether this metadata came from a catalog entry
    pub fn is_catalogued(&self) -> bool {
        self.catalogued
    }
}

/// A single reference document loaded from the corpus
#[derive(Debug, Clone)]
pub struct DocumentRecord {
    id: DocumentId,
    raw_text: String,
    metadata: Arc<ToolMetadata>,
}

impl DocumentRecord {
    /// Create a new document record
    pub fn new(id: DocumentId, raw_text: impl Into<String>, metadata: ToolMetadata) -> Self {
        Self {
            id,
            raw_text: raw_text.into(),
            metadata: Arc::new(metadata),
        }
    }

    /// Document identifier
    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    /// Full document text
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    /// Tool metadata for this document
    pub fn metadata(&self) -> &ToolMetadata {
        &self.metadata
    }

    /// Shared handle to the metadata, for attaching to chunks
    pub fn shared_metadata(&self) -> Arc<ToolMetadata> {
        Arc::clone(&self.metadata)
    }
}

/// A window of a document's text used as a retrieval unit
#[derive(Debug, Clone)]
pub struct Chunk {
    document_id: DocumentId,
    text: String,
    start_offset: usize,
    metadata: Arc<ToolMetadata>,
}

impl Chunk {
    /// Create a chunk owned by `document`
    ///
    /// `start_offset` is measured in characters from the start of the
    /// document text.
    pub fn new(document: &DocumentRecord, text: impl Into<String>, start_offset: usize) -> Self {
        Self {
            document_id: document.id().clone(),
            text: text.into(),
            start_offset,
            metadata: document.shared_metadata(),
        }
    }

    /// Identifier of the owning document
    pub fn document_id(&self) -> &DocumentId {
        &self.document_id
    }

    /// Chunk text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Character offset of the chunk within its document
    pub fn start_offset(&self) -> usize {
        self.start_offset
    }

    /// Character offset one past the end of the chunk
    pub fn end_offset(&self) -> usize {
        self.start_offset + self.text.chars().count()
    }

    /// Metadata inherited from the owning document
    pub fn metadata(&self) -> &ToolMetadata {
        &self.metadata
    }

    /// Whether two chunks share the very same metadata allocation
    pub fn shares_metadata_with(&self, other: &Chunk) -> bool {
        Arc::ptr_eq(&self.metadata, &other.metadata)
    }
}
