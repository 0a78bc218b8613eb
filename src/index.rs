//! Per-document vector similarity index.
//!
//! Holds one unit-normalized embedding per chunk, parallel to the chunk
//! list, and answers queries by inner product (equal to cosine similarity
//! under normalization — vectors are always normalized before storage and
//! before comparison, never after the dot product).
//!
//! The index persists as two halves per document: a raw little-endian f32
//! blob (`<id>.vec`) and a JSON metadata file (`<id>.meta.json`) carrying
//! the chunk list, model identifier, and dimensionality. Both halves must
//! be present to load; a reload reproduces search results bit-for-bit for
//! the same embedder.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::embedding::{blob_to_vec, normalize_l2, vec_to_blob, EmbeddingProvider};
use crate::models::{Chunk, ContextChunk, ScoredChunk};

/// Index failure.
#[derive(Debug)]
pub enum IndexError {
    /// The embedder was unavailable or rejected its input.
    Embedding(String),
    /// Persisted state is unreadable, incomplete, or inconsistent; the
    /// index must be rebuilt from source.
    Corrupt(String),
    /// Filesystem or serialization failure while persisting.
    Persist(String),
}

impl std::fmt::Display for IndexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexError::Embedding(e) => write!(f, "embedding failed: {}", e),
            IndexError::Corrupt(e) => write!(f, "corrupt index: {}", e),
            IndexError::Persist(e) => write!(f, "index persistence failed: {}", e),
        }
    }
}

impl std::error::Error for IndexError {}

/// JSON metadata half of a persisted index.
#[derive(Serialize, Deserialize)]
struct IndexMeta {
    model_name: String,
    dims: usize,
    chunks: Vec<Chunk>,
}

/// Similarity index over one document's chunks.
#[derive(Debug)]
pub struct VectorIndex {
    model_name: String,
    dims: usize,
    embeddings: Vec<Vec<f32>>,
    chunks: Vec<Chunk>,
}

impl VectorIndex {
    /// Create an empty index bound to the embedder's model identity.
    pub fn new(embedder: &dyn EmbeddingProvider) -> Self {
        Self {
            model_name: embedder.model_name().to_string(),
            dims: embedder.dims(),
            embeddings: Vec::new(),
            chunks: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Embed every chunk (batched by the provider) and store normalized
    /// vectors parallel to the chunk list. Replaces any previous contents;
    /// a document gets a fresh index, there are no merge semantics.
    pub async fn build(
        &mut self,
        chunks: Vec<Chunk>,
        embedder: &dyn EmbeddingProvider,
    ) -> Result<(), IndexError> {
        if let Some(empty) = chunks.iter().find(|c| c.text.trim().is_empty()) {
            return Err(IndexError::Embedding(format!(
                "chunk {} has empty text",
                empty.id
            )));
        }

        if chunks.is_empty() {
            self.embeddings.clear();
            self.chunks.clear();
            return Ok(());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let mut vectors = embedder
            .embed(&texts)
            .await
            .map_err(|e| IndexError::Embedding(e.to_string()))?;

        if vectors.len() != chunks.len() {
            return Err(IndexError::Embedding(format!(
                "embedder returned {} vectors for {} chunks",
                vectors.len(),
                chunks.len()
            )));
        }
        for vector in &mut vectors {
            if vector.len() != self.dims {
                return Err(IndexError::Embedding(format!(
                    "embedder returned {}-dim vector, index expects {}",
                    vector.len(),
                    self.dims
                )));
            }
            normalize_l2(vector);
        }

        self.embeddings = vectors;
        self.chunks = chunks;
        tracing::info!(vectors = self.embeddings.len(), "index built");
        Ok(())
    }

    /// Return the top `k` chunks by similarity to `query`, scores below
    /// `score_threshold` removed, ranks 1-based over the returned set.
    ///
    /// Ties on score break toward the lower chunk id, keeping document
    /// order stable. An empty index yields an empty result, not an error.
    pub async fn search(
        &self,
        query: &str,
        k: usize,
        score_threshold: f32,
        embedder: &dyn EmbeddingProvider,
    ) -> Result<Vec<ScoredChunk>, IndexError> {
        if self.embeddings.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let mut query_vec = embedder
            .embed(&[query.to_string()])
            .await
            .map_err(|e| IndexError::Embedding(e.to_string()))?
            .into_iter()
            .next()
            .ok_or_else(|| IndexError::Embedding("empty embedding response".to_string()))?;

        if query_vec.len() != self.dims {
            return Err(IndexError::Embedding(format!(
                "query embedding has {} dims, index expects {}",
                query_vec.len(),
                self.dims
            )));
        }
        normalize_l2(&mut query_vec);

        let mut scored: Vec<(f32, &Chunk)> = self
            .embeddings
            .iter()
            .zip(self.chunks.iter())
            .map(|(vector, chunk)| (dot(&query_vec, vector), chunk))
            .collect();

        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.1.id.cmp(&b.1.id))
        });
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .filter(|(score, _)| *score >= score_threshold)
            .enumerate()
            .map(|(i, (score, chunk))| ScoredChunk {
                chunk: chunk.clone(),
                score,
                rank: i + 1,
            })
            .collect())
    }

    /// Expand search hits with neighboring chunks: for each hit id, include
    /// ids in `[id - window, id + window]` clamped to the valid range.
    /// Output is deduplicated, ascending by id, and a superset of the hits;
    /// chunks that were not original hits are flagged `is_context`.
    pub fn expand_with_context(&self, results: &[ScoredChunk], window: usize) -> Vec<ContextChunk> {
        if results.is_empty() || self.chunks.is_empty() {
            return Vec::new();
        }

        let hits: BTreeSet<usize> = results.iter().map(|r| r.chunk.id).collect();
        let last = self.chunks.len() - 1;

        let mut expanded = BTreeSet::new();
        for &id in &hits {
            let lo = id.saturating_sub(window);
            let hi = (id + window).min(last);
            for neighbor in lo..=hi {
                expanded.insert(neighbor);
            }
        }

        expanded
            .into_iter()
            .filter_map(|id| {
                self.chunks.get(id).map(|chunk| ContextChunk {
                    chunk: chunk.clone(),
                    is_context: !hits.contains(&id),
                })
            })
            .collect()
    }

    /// Write both index halves under `dir` for `doc_id`.
    pub fn save(&self, dir: &Path, doc_id: &str) -> Result<(), IndexError> {
        let mut blob = Vec::with_capacity(self.embeddings.len() * self.dims * 4);
        for vector in &self.embeddings {
            blob.extend_from_slice(&vec_to_blob(vector));
        }
        std::fs::write(vec_path(dir, doc_id), &blob)
            .map_err(|e| IndexError::Persist(e.to_string()))?;

        let meta = IndexMeta {
            model_name: self.model_name.clone(),
            dims: self.dims,
            chunks: self.chunks.clone(),
        };
        let json =
            serde_json::to_vec_pretty(&meta).map_err(|e| IndexError::Persist(e.to_string()))?;
        std::fs::write(meta_path(dir, doc_id), json)
            .map_err(|e| IndexError::Persist(e.to_string()))?;
        Ok(())
    }

    /// Load both index halves for `doc_id` from `dir`.
    ///
    /// Either half missing, or the two halves disagreeing in size, is
    /// [`IndexError::Corrupt`]. A stored model identifier that differs
    /// from the configured embedder is surfaced as a warning, not an
    /// error — the caller decides whether to rebuild.
    pub fn load(
        dir: &Path,
        doc_id: &str,
        embedder: &dyn EmbeddingProvider,
    ) -> Result<Self, IndexError> {
        let vec_file = vec_path(dir, doc_id);
        let meta_file = meta_path(dir, doc_id);
        if !vec_file.exists() || !meta_file.exists() {
            return Err(IndexError::Corrupt(format!(
                "index for '{}' requires both {} and {}",
                doc_id,
                vec_file.display(),
                meta_file.display()
            )));
        }

        let blob = std::fs::read(&vec_file).map_err(|e| IndexError::Persist(e.to_string()))?;
        let meta_bytes =
            std::fs::read(&meta_file).map_err(|e| IndexError::Persist(e.to_string()))?;
        let meta: IndexMeta = serde_json::from_slice(&meta_bytes)
            .map_err(|e| IndexError::Corrupt(format!("unreadable metadata: {}", e)))?;

        if meta.dims == 0 {
            return Err(IndexError::Corrupt("stored dims is zero".to_string()));
        }
        let row_bytes = meta.dims * 4;
        if blob.len() % row_bytes != 0 {
            return Err(IndexError::Corrupt(format!(
                "vector blob length {} is not a multiple of {}-dim rows",
                blob.len(),
                meta.dims
            )));
        }
        let rows = blob.len() / row_bytes;
        if rows != meta.chunks.len() {
            return Err(IndexError::Corrupt(format!(
                "{} stored vectors but {} chunks",
                rows,
                meta.chunks.len()
            )));
        }

        if meta.model_name != embedder.model_name() {
            tracing::warn!(
                stored = %meta.model_name,
                configured = %embedder.model_name(),
                "embedding model mismatch; stored vectors are not comparable with the configured model"
            );
        }

        let embeddings = blob.chunks_exact(row_bytes).map(blob_to_vec).collect();

        Ok(Self {
            model_name: meta.model_name,
            dims: meta.dims,
            embeddings,
            chunks: meta.chunks,
        })
    }

    /// Delete both persisted halves, ignoring files that never existed.
    pub fn remove_artifacts(dir: &Path, doc_id: &str) {
        let _ = std::fs::remove_file(vec_path(dir, doc_id));
        let _ = std::fs::remove_file(meta_path(dir, doc_id));
    }
}

fn vec_path(dir: &Path, doc_id: &str) -> std::path::PathBuf {
    dir.join(format!("{}.vec", doc_id))
}

fn meta_path(dir: &Path, doc_id: &str) -> std::path::PathBuf {
    dir.join(format!("{}.meta.json", doc_id))
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
pub(crate) mod stub {
    //! Deterministic embedder for tests: preset vectors by exact text,
    //! hash-derived vectors otherwise.

    use std::collections::HashMap;

    use anyhow::Result;
    use async_trait::async_trait;

    use crate::embedding::EmbeddingProvider;

    pub struct StubEmbedder {
        pub name: String,
        pub dims: usize,
        pub presets: HashMap<String, Vec<f32>>,
    }

    impl StubEmbedder {
        pub fn new(dims: usize) -> Self {
            Self {
                name: "stub-embedder".to_string(),
                dims,
                presets: HashMap::new(),
            }
        }

        pub fn with_preset(mut self, text: &str, vector: Vec<f32>) -> Self {
            self.presets.insert(text.to_string(), vector);
            self
        }

        fn derive(&self, text: &str) -> Vec<f32> {
            let mut state: u64 = 0xcbf29ce484222325;
            for byte in text.bytes() {
                state ^= byte as u64;
                state = state.wrapping_mul(0x100000001b3);
            }
            (0..self.dims)
                .map(|i| {
                    state = state.wrapping_mul(6364136223846793005).wrapping_add(i as u64);
                    ((state >> 33) as f32 / u32::MAX as f32) - 0.5
                })
                .collect()
        }
    }

    #[async_trait]
    impl EmbeddingProvider for StubEmbedder {
        fn model_name(&self) -> &str {
            &self.name
        }
        fn dims(&self) -> usize {
            self.dims
        }
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| self.presets.get(t).cloned().unwrap_or_else(|| self.derive(t)))
                .collect())
        }
    }

    /// An embedder that always fails, for exercising error paths.
    pub struct FailingEmbedder;

    #[async_trait]
    impl EmbeddingProvider for FailingEmbedder {
        fn model_name(&self) -> &str {
            "failing-embedder"
        }
        fn dims(&self) -> usize {
            3
        }
        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            anyhow::bail!("model unavailable")
        }
    }
}
