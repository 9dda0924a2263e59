//! Semantic index over the reference corpus
//!
//! The index is built lazily on first use and then shared read-only. A
//! rebuild constructs a complete new snapshot off to the side and swaps it
//! in, so concurrent queries see either the old collection or the new one,
//! never a partial one. Chunks from a replaced snapshot are dropped with it.

use crate::chunking::Chunker;
use crate::config::RagConfig;
use crate::corpus::CorpusLoader;
use crate::vector_index::VectorIndex;
use crate::RagError;
use cyberquery_domain::{Chunk, EmbeddingModel};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Instant;
use tracing::{debug, info, warn};

const EMBED_BATCH_SIZE: usize = 32;

/// A chunk together with its embedding
#[derive(Debug, Clone)]
pub struct IndexEntry {
    /// The indexed chunk
    pub chunk: Chunk,
    /// Embedding of the chunk text
    pub embedding: Vec<f32>,
}

/// A chunk returned by a query, with its similarity score
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    /// The matching chunk
    pub chunk: Chunk,
    /// Similarity to the query (higher is more relevant)
    pub score: f32,
}

/// Chunks returned by a query, most relevant first
#[derive(Debug, Clone, Default)]
pub struct RankedResult(Vec<ScoredChunk>);

impl RankedResult {
    /// Build a result from scored chunks, sorting by descending score
    pub fn from_scored(mut scored: Vec<ScoredChunk>) -> Self {
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        Self(scored)
    }

    /// Iterate over the scored chunks in rank order
    pub fn iter(&self) -> std::slice::Iter<'_, ScoredChunk> {
        self.0.iter()
    }

    /// Number of chunks
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no chunks were found
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume into the underlying vector
    pub fn into_inner(self) -> Vec<ScoredChunk> {
        self.0
    }
}

impl<'a> IntoIterator for &'a RankedResult {
    type Item = &'a ScoredChunk;
    type IntoIter = std::slice::Iter<'a, ScoredChunk>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Observable state of a semantic index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    /// No successful build yet
    Unbuilt,
    /// Built, but the corpus produced no chunks
    Empty,
    /// Built and queryable
    Ready {
        /// Number of indexed chunks
        chunks: usize,
    },
}

struct IndexSnapshot {
    entries: Vec<IndexEntry>,
    vectors: Option<VectorIndex>,
}

impl IndexSnapshot {
    fn empty() -> Self {
        Self {
            entries: Vec::new(),
            vectors: None,
        }
    }

    fn state(&self) -> IndexState {
        if self.entries.is_empty() {
            IndexState::Empty
        } else {
            IndexState::Ready {
                chunks: self.entries.len(),
            }
        }
    }
}

/// Embeddable, queryable collection of corpus chunks
///
/// Generic over the embedding backend so tests can run fully offline.
pub struct SemanticIndex<E> {
    loader: CorpusLoader,
    chunker: Chunker,
    embedder: E,
    snapshot: RwLock<Option<Arc<IndexSnapshot>>>,
    build_guard: Mutex<()>,
}

impl<E> SemanticIndex<E>
where
    E: EmbeddingModel,
    E::Error: std::fmt::Display,
{
    /// Create an unbuilt index
    pub fn new(loader: CorpusLoader, chunker: Chunker, embedder: E) -> Self {
        Self {
            loader,
            chunker,
            embedder,
            snapshot: RwLock::new(None),
            build_guard: Mutex::new(()),
        }
    }

    /// Create an unbuilt index from retrieval configuration
    pub fn from_config(config: &RagConfig, embedder: E) -> Result<Self, RagError> {
        config.validate()?;
        Ok(Self::new(
            CorpusLoader::from_config(config),
            Chunker::from_config(config)?,
            embedder,
        ))
    }

    /// The embedding backend
    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    /// Build the index if it has not been built yet
    ///
    /// Calling this on a built index is a no-op. If the embedding backend
    /// fails, the index stays unbuilt and the next call tries again.
    pub fn build(&self) -> IndexState {
        if let Some(snapshot) = self.current() {
            return snapshot.state();
        }

        let _guard = self.build_guard.lock().unwrap_or_else(PoisonError::into_inner);
        // Another caller may have finished while we waited
        if let Some(snapshot) = self.current() {
            return snapshot.state();
        }

        match self.build_snapshot() {
            Some(snapshot) => self.install(snapshot),
            None => IndexState::Unbuilt,
        }
    }

    /// Discard the current collection and build a fresh one from disk
    ///
    /// On embedding failure the previous collection is kept.
    pub fn rebuild(&self) -> IndexState {
        let _guard = self.build_guard.lock().unwrap_or_else(PoisonError::into_inner);
        match self.build_snapshot() {
            Some(snapshot) => self.install(snapshot),
            None => self.state(),
        }
    }

    /// Find the `k` chunks most similar to `text`
    ///
    /// Never fails: an empty query, an empty index or a backend error all
    /// yield an empty result.
    pub fn query(&self, text: &str, k: usize) -> RankedResult {
        if text.trim().is_empty() || k == 0 {
            return RankedResult::default();
        }

        let snapshot = match self.current() {
            Some(snapshot) => snapshot,
            None => {
                self.build();
                match self.current() {
                    Some(snapshot) => snapshot,
                    None => return RankedResult::default(),
                }
            }
        };

        let Some(vectors) = snapshot.vectors.as_ref() else {
            return RankedResult::default();
        };

        let query_vector = match self.embedder.embed(text) {
            Ok(vector) => vector,
            Err(e) => {
                warn!(error = %e, "Query embedding failed, continuing without context");
                return RankedResult::default();
            }
        };

        let neighbours = match vectors.search(&query_vector, k) {
            Ok(neighbours) => neighbours,
            Err(e) => {
                warn!(error = %e, "Vector search failed, continuing without context");
                return RankedResult::default();
            }
        };

        let scored = neighbours
            .into_iter()
            .filter_map(|(id, score)| {
                snapshot.entries.get(id).map(|entry| ScoredChunk {
                    chunk: entry.chunk.clone(),
                    score,
                })
            })
            .collect();

        let result = RankedResult::from_scored(scored);
        debug!(k, found = result.len(), "Semantic query complete");
        result
    }

    /// Current state of the index
    pub fn state(&self) -> IndexState {
        self.current()
            .map(|snapshot| snapshot.state())
            .unwrap_or(IndexState::Unbuilt)
    }

    /// Whether a build has completed
    pub fn is_built(&self) -> bool {
        self.current().is_some()
    }

    /// Number of indexed chunks
    pub fn len(&self) -> usize {
        self.current().map(|s| s.entries.len()).unwrap_or(0)
    }

    /// Whether the index holds no chunks
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn current(&self) -> Option<Arc<IndexSnapshot>> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn install(&self, snapshot: IndexSnapshot) -> IndexState {
        let state = snapshot.state();
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(snapshot));
        state
    }

    fn build_snapshot(&self) -> Option<IndexSnapshot> {
        let started = Instant::now();
        let documents = self.loader.load();
        let chunks: Vec<Chunk> = self
            .chunker
            .chunk_documents(&documents)
            .into_iter()
            .filter(|chunk| !chunk.text().trim().is_empty())
            .collect();

        if chunks.is_empty() {
            info!(dir = %self.loader.data_dir().display(), "No reference chunks to index");
            return Some(IndexSnapshot::empty());
        }

        let mut embeddings = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(EMBED_BATCH_SIZE) {
            let texts: Vec<&str> = batch.iter().map(|c| c.text()).collect();
            match self.embedder.embed_batch(&texts) {
                Ok(vectors) => embeddings.extend(vectors),
                Err(e) => {
                    warn!(error = %e, chunks = chunks.len(), "Embedding failed, index not built");
                    return None;
                }
            }
        }

        let dimension = embeddings.first().map(Vec::len).unwrap_or(0);
        let mut vectors = VectorIndex::new(dimension, chunks.len());
        let mut entries = Vec::with_capacity(chunks.len());

        for (chunk, embedding) in chunks.into_iter().zip(embeddings) {
            let id = entries.len();
            if let Err(e) = vectors.add(id, &embedding) {
                warn!(document = %chunk.document_id(), error = %e, "Skipping chunk");
                continue;
            }
            entries.push(IndexEntry { chunk, embedding });
        }

        info!(
            documents = documents.len(),
            chunks = entries.len(),
            dimension,
            duration_ms = started.elapsed().as_millis() as u64,
            "Semantic index built"
        );

        if entries.is_empty() {
            return Some(IndexSnapshot::empty());
        }
        Some(IndexSnapshot {
            entries,
            vectors: Some(vectors),
        })
    }
}

impl<E> std::fmt::Debug for SemanticIndex<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticIndex")
            .field("loader", &self.loader)
            .field("chunker", &self.chunker)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::MockEmbeddingModel;
    use cyberquery_domain::{DocumentId, DocumentRecord, ToolMetadata};

    fn unbacked_index(embedder: MockEmbeddingModel) -> SemanticIndex<MockEmbeddingModel> {
        SemanticIndex::new(
            CorpusLoader::new("/nonexistent/rag_data", "/nonexistent/rag_data/tools.json"),
            Chunker::default(),
            embedder,
        )
    }

    #[test]
    fn test_ranked_result_sorts_descending() {
        let doc = DocumentRecord::new(DocumentId::new("a.txt"), "text", ToolMetadata::unknown("a"));
        let result = RankedResult::from_scored(vec![
            ScoredChunk { chunk: Chunk::new(&doc, "low", 0), score: 0.1 },
            ScoredChunk { chunk: Chunk::new(&doc, "high", 0), score: 0.9 },
            ScoredChunk { chunk: Chunk::new(&doc, "mid", 0), score: 0.5 },
        ]);
        let texts: Vec<&str> = result.iter().map(|s| s.chunk.text()).collect();
        assert_eq!(texts, vec!["high", "mid", "low"]);
    }

    #[test]
    fn test_missing_corpus_builds_empty_index() {
        let index = unbacked_index(MockEmbeddingModel::new(64));
        assert_eq!(index.state(), IndexState::Unbuilt);
        assert_eq!(index.build(), IndexState::Empty);
        assert!(index.is_built());
        assert!(index.query("scan ports", 3).is_empty());
    }

    #[test]
    fn test_empty_query_returns_nothing() {
        let index = unbacked_index(MockEmbeddingModel::new(64));
        assert!(index.query("   ", 3).is_empty());
        // Blank queries do not trigger a build
        assert!(!index.is_built());
    }
}
