//! Core data models used throughout docquery.
//!
//! These types represent the chunks, document metadata, and retrieval
//! results that flow through the ingestion and question-answering pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A contiguous slice of a document's cleaned text, the unit of retrieval.
///
/// Offsets are character positions into the cleaned source text. Ids are
/// dense, assigned in position order starting at 0, and never change after
/// ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: usize,
    pub text: String,
    pub start_pos: usize,
    pub end_pos: usize,
    pub length: usize,
}

/// Document-level metadata captured at ingestion.
///
/// Fields the source document does not carry stay empty; title and author
/// default to `"Unknown"` as upstream viewers expect a value there.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: String,
    pub author: String,
    pub subject: String,
    pub creator: String,
    pub producer: String,
    pub creation_date: String,
    pub modification_date: String,
    pub page_count: usize,
}

impl Default for DocumentMetadata {
    fn default() -> Self {
        Self {
            title: "Unknown".to_string(),
            author: "Unknown".to_string(),
            subject: String::new(),
            creator: String::new(),
            producer: String::new(),
            creation_date: String::new(),
            modification_date: String::new(),
            page_count: 0,
        }
    }
}

/// A chunk returned from similarity search, with its score and 1-based rank.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    /// Cosine similarity in `[-1, 1]` (inner product of unit vectors).
    pub score: f32,
    /// 1-based position within the returned result set.
    pub rank: usize,
}

/// A chunk produced by context-window expansion around search hits.
#[derive(Debug, Clone, Serialize)]
pub struct ContextChunk {
    pub chunk: Chunk,
    /// True when the chunk was pulled in as surrounding context rather
    /// than being one of the original hits.
    pub is_context: bool,
}

/// One question/answer exchange in the session history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub question: String,
    pub answer: String,
    pub timestamp: DateTime<Utc>,
    pub document_id: String,
}

/// Listing entry for a stored document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentInfo {
    pub id: String,
    pub metadata: DocumentMetadata,
    pub chunk_count: usize,
    pub created_at: DateTime<Utc>,
}
