//! Document registry owning every document's chunks and vector index.
//!
//! Each document persists as a record file (`<id>.doc.json`) plus the two
//! index halves written by [`VectorIndex::save`]. [`DocumentStore::open`]
//! reloads whatever is on disk; a document whose index artifacts are
//! missing or corrupt is skipped with a warning and must be re-ingested
//! from source.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::embedding::EmbeddingProvider;
use crate::index::{IndexError, VectorIndex};
use crate::models::{Chunk, DocumentInfo, DocumentMetadata, ScoredChunk};

const DOC_RECORD_SUFFIX: &str = ".doc.json";

/// A registered document: identity, metadata, and its owned index.
pub struct DocumentRecord {
    pub id: String,
    pub metadata: DocumentMetadata,
    pub created_at: DateTime<Utc>,
    pub index: VectorIndex,
}

/// On-disk form of a document record (the index persists separately).
#[derive(Serialize, Deserialize)]
struct RecordFile {
    id: String,
    metadata: DocumentMetadata,
    created_at: DateTime<Utc>,
}

/// Owns all [`DocumentRecord`]s, keyed by document id, in insertion order.
pub struct DocumentStore {
    storage_dir: PathBuf,
    documents: Vec<DocumentRecord>,
}

impl DocumentStore {
    /// Open a store rooted at `storage_dir`, creating the directory if
    /// needed and loading any previously persisted documents.
    pub fn open(
        storage_dir: &Path,
        embedder: &dyn EmbeddingProvider,
    ) -> Result<Self, IndexError> {
        std::fs::create_dir_all(storage_dir).map_err(|e| IndexError::Persist(e.to_string()))?;

        let mut documents = Vec::new();
        let entries =
            std::fs::read_dir(storage_dir).map_err(|e| IndexError::Persist(e.to_string()))?;
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !name.ends_with(DOC_RECORD_SUFFIX) {
                continue;
            }

            let record: RecordFile = match std::fs::read(entry.path())
                .map_err(|e| e.to_string())
                .and_then(|bytes| serde_json::from_slice(&bytes).map_err(|e| e.to_string()))
            {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(file = %name, error = %e, "skipping unreadable document record");
                    continue;
                }
            };

            match VectorIndex::load(storage_dir, &record.id, embedder) {
                Ok(index) => documents.push(DocumentRecord {
                    id: record.id,
                    metadata: record.metadata,
                    created_at: record.created_at,
                    index,
                }),
                Err(e) => {
                    tracing::warn!(
                        document = %record.id,
                        error = %e,
                        "skipping document with unloadable index; re-ingest to rebuild"
                    );
                }
            }
        }

        // Directory listing order is arbitrary; restore ingestion order.
        documents.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        Ok(Self {
            storage_dir: storage_dir.to_path_buf(),
            documents,
        })
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.documents.iter().any(|d| d.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&DocumentRecord> {
        self.documents.iter().find(|d| d.id == id)
    }

    /// Build a fresh index over `chunks`, persist it with the document
    /// record, and register the document. On any failure nothing is
    /// registered and no artifacts are left behind.
    pub async fn add_document(
        &mut self,
        id: &str,
        chunks: Vec<Chunk>,
        metadata: DocumentMetadata,
        embedder: &dyn EmbeddingProvider,
    ) -> Result<(), IndexError> {
        let mut index = VectorIndex::new(embedder);
        index.build(chunks, embedder).await?;

        if let Err(e) = index.save(&self.storage_dir, id) {
            VectorIndex::remove_artifacts(&self.storage_dir, id);
            return Err(e);
        }

        let created_at = Utc::now();
        let record_file = RecordFile {
            id: id.to_string(),
            metadata: metadata.clone(),
            created_at,
        };
        let record_path = self.record_path(id);
        let write_result = serde_json::to_vec_pretty(&record_file)
            .map_err(|e| e.to_string())
            .and_then(|bytes| std::fs::write(&record_path, bytes).map_err(|e| e.to_string()));
        if let Err(e) = write_result {
            VectorIndex::remove_artifacts(&self.storage_dir, id);
            let _ = std::fs::remove_file(&record_path);
            return Err(IndexError::Persist(e));
        }

        // Re-adding an id replaces the old record.
        self.documents.retain(|d| d.id != id);
        self.documents.push(DocumentRecord {
            id: id.to_string(),
            metadata,
            created_at,
            index,
        });
        tracing::info!(document = %id, "document registered");
        Ok(())
    }

    /// Search one document. An unknown id yields an empty result set,
    /// not an error.
    pub async fn search_document(
        &self,
        id: &str,
        query: &str,
        k: usize,
        score_threshold: f32,
        embedder: &dyn EmbeddingProvider,
    ) -> Result<Vec<ScoredChunk>, IndexError> {
        match self.get(id) {
            Some(record) => record.index.search(query, k, score_threshold, embedder).await,
            None => {
                tracing::warn!(document = %id, "search against unknown document");
                Ok(Vec::new())
            }
        }
    }

    /// Fan a query out across every document, keeping only documents with
    /// at least one result above the threshold. Pairs are returned in
    /// document insertion order.
    pub async fn search_all_documents(
        &self,
        query: &str,
        k: usize,
        score_threshold: f32,
        embedder: &dyn EmbeddingProvider,
    ) -> Result<Vec<(String, Vec<ScoredChunk>)>, IndexError> {
        let mut results = Vec::new();
        for record in &self.documents {
            let matches = record.index.search(query, k, score_threshold, embedder).await?;
            if !matches.is_empty() {
                results.push((record.id.clone(), matches));
            }
        }
        Ok(results)
    }

    /// Snapshot of all documents in insertion order.
    pub fn list(&self) -> Vec<DocumentInfo> {
        self.documents
            .iter()
            .map(|d| DocumentInfo {
                id: d.id.clone(),
                metadata: d.metadata.clone(),
                chunk_count: d.index.len(),
                created_at: d.created_at,
            })
            .collect()
    }

    pub fn total_chunks(&self) -> usize {
        self.documents.iter().map(|d| d.index.len()).sum()
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.storage_dir.join(format!("{}{}", id, DOC_RECORD_SUFFIX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::stub::{FailingEmbedder, StubEmbedder};

    fn make_chunk(id: usize, text: &str) -> Chunk {
        Chunk {
            id,
            text: text.to_string(),
            start_pos: id * 100,
            end_pos: id * 100 + text.len(),
            length: text.len(),
        }
    }

    fn embedder() -> StubEmbedder {
        StubEmbedder::new(3)
            .with_preset("rust systems", vec![1.0, 0.0, 0.0])
            .with_preset("python scripting", vec![0.0, 1.0, 0.0])
            .with_preset("rust", vec![1.0, 0.0, 0.0])
    }

    #[tokio::test]
    async fn add_and_list_in_insertion_order() {
        let dir = tempfile::tempdir().unwrap();
        let embedder = embedder();
        let mut store = DocumentStore::open(dir.path(), &embedder).unwrap();

        store
            .add_document(
                "doc-b",
                vec![make_chunk(0, "rust systems")],
                DocumentMetadata::default(),
                &embedder,
            )
            .await
            .unwrap();
        store
            .add_document(
                "doc-a",
                vec![make_chunk(0, "python scripting")],
                DocumentMetadata::default(),
                &embedder,
            )
            .await
            .unwrap();

        let listing = store.list();
        let ids: Vec<&str> = listing.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["doc-b", "doc-a"]);
        assert_eq!(listing[0].chunk_count, 1);
    }

    #[tokio::test]
    async fn unknown_document_searches_empty() {
        let dir = tempfile::tempdir().unwrap();
        let embedder = embedder();
        let store = DocumentStore::open(dir.path(), &embedder).unwrap();

        let results = store
            .search_document("ghost", "rust", 5, 0.3, &embedder)
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn search_all_excludes_documents_without_matches() {
        let dir = tempfile::tempdir().unwrap();
        let embedder = embedder();
        let mut store = DocumentStore::open(dir.path(), &embedder).unwrap();

        store
            .add_document(
                "rusty",
                vec![make_chunk(0, "rust systems")],
                DocumentMetadata::default(),
                &embedder,
            )
            .await
            .unwrap();
        store
            .add_document(
                "snake",
                vec![make_chunk(0, "python scripting")],
                DocumentMetadata::default(),
                &embedder,
            )
            .await
            .unwrap();

        let results = store
            .search_all_documents("rust", 5, 0.3, &embedder)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, "rusty");
        assert_eq!(results[0].1.len(), 1);
    }

    #[tokio::test]
    async fn failed_build_registers_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let embedder = FailingEmbedder;
        let mut store = DocumentStore::open(dir.path(), &embedder).unwrap();

        let err = store
            .add_document(
                "doomed",
                vec![make_chunk(0, "text")],
                DocumentMetadata::default(),
                &embedder,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, IndexError::Embedding(_)));
        assert!(store.list().is_empty());
        assert!(!dir.path().join("doomed.doc.json").exists());
    }

    #[tokio::test]
    async fn reopened_store_lists_same_documents() {
        let dir = tempfile::tempdir().unwrap();
        let embedder = embedder();
        {
            let mut store = DocumentStore::open(dir.path(), &embedder).unwrap();
            store
                .add_document(
                    "first",
                    vec![make_chunk(0, "rust systems")],
                    DocumentMetadata::default(),
                    &embedder,
                )
                .await
                .unwrap();
            store
                .add_document(
                    "second",
                    vec![make_chunk(0, "python scripting")],
                    DocumentMetadata::default(),
                    &embedder,
                )
                .await
                .unwrap();
        }

        let reopened = DocumentStore::open(dir.path(), &embedder).unwrap();
        let ids: Vec<String> = reopened.list().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["first", "second"]);

        let results = reopened
            .search_document("first", "rust", 5, 0.3, &embedder)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
    }
}
