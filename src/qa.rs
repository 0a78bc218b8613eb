//! Question-answering orchestration.
//!
//! [`QaEngine`] coordinates the full flow: upload → extract → clean →
//! chunk → index → select, then question → retrieve → prompt → generate →
//! answer bundle with cited sources and follow-ups. Session state (the
//! selected document and conversation history) lives in an explicit
//! [`Session`] passed into every call, never in ambient engine state.
//!
//! Retrieval-side problems (no document, nothing relevant) are typed
//! errors. Generator-side problems never are: a failed or timed-out
//! generation is pattern-matched into a degraded answer so `ask` always
//! returns a bundle once retrieval succeeded.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::chunk;
use crate::config::{ChunkingConfig, Config, GeneratorConfig, RetrievalConfig};
use crate::embedding::EmbeddingProvider;
use crate::extract::{self, ExtractError};
use crate::generator::{
    self, AnswerGenerator, FALLBACK_FOLLOW_UPS, FOLLOW_UP_MAX_TOKENS, SUMMARY_MAX_TOKENS,
};
use crate::index::IndexError;
use crate::models::{ContextChunk, ConversationEntry, DocumentInfo, ScoredChunk};
use crate::store::DocumentStore;

/// Answer returned when the generator fails outright.
const DEGRADED_ANSWER: &str = "I apologize, but I'm unable to generate an answer at this time. \
Please try rephrasing your question or try again later.";

/// Summary returned when the generator fails or produces nothing.
const DEGRADED_SUMMARY: &str = "Unable to generate a summary at this time.";

/// Characters kept in a cited source preview.
const PREVIEW_CHARS: usize = 100;

/// Sources attached to an answer.
const MAX_SOURCES: usize = 3;

/// Failure of a QA operation.
#[derive(Debug)]
pub enum QaError {
    /// No document is selected in the session.
    NoDocumentSelected,
    /// The requested document id is not in the store.
    NotFound(String),
    /// Retrieval succeeded but no chunk cleared the similarity threshold.
    /// An expected, user-visible outcome, not a system fault.
    NoRelevantContext,
    /// The source document could not be read.
    Extraction(ExtractError),
    /// Index build, search, or persistence failed.
    Index(IndexError),
}

impl std::fmt::Display for QaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QaError::NoDocumentSelected => {
                write!(f, "no document selected; upload or select a document first")
            }
            QaError::NotFound(id) => write!(f, "document not found: {}", id),
            QaError::NoRelevantContext => {
                write!(f, "no relevant information found in the document")
            }
            QaError::Extraction(e) => write!(f, "{}", e),
            QaError::Index(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for QaError {}

/// Per-user session state, injected into every engine call.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Session {
    pub current_document: Option<String>,
    pub history: Vec<ConversationEntry>,
}

impl Session {
    /// Load session state from `path`; a missing or unreadable file yields
    /// a fresh session.
    pub fn load(path: &Path) -> Self {
        match std::fs::read(path) {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(session) => session,
                Err(e) => {
                    tracing::warn!(error = %e, "unreadable session file, starting fresh");
                    Session::default()
                }
            },
            Err(_) => Session::default(),
        }
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let bytes = serde_json::to_vec_pretty(self)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

/// Result of an upload.
#[derive(Debug, Clone, Serialize)]
pub struct UploadOutcome {
    pub document_id: String,
    pub is_new: bool,
    pub title: String,
    pub page_count: usize,
    pub chunk_count: usize,
}

/// A cited source attached to an answer.
#[derive(Debug, Clone, Serialize)]
pub struct SourceRef {
    pub chunk_id: usize,
    pub similarity_score: f32,
    pub preview: String,
}

/// A complete answer to one question.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerBundle {
    pub question: String,
    pub answer: String,
    pub document_id: String,
    pub document_title: String,
    pub sources: Vec<SourceRef>,
    pub follow_up_questions: Vec<String>,
    pub context_chunks_used: usize,
    pub model_used: String,
    pub timestamp: DateTime<Utc>,
}

/// Result of a summarization request.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryOutcome {
    pub document_id: String,
    pub title: String,
    pub summary: String,
    pub chunks_used: usize,
    pub total_chunks: usize,
}

/// Matches for one document within a search.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentMatches {
    pub document_id: String,
    pub matches: Vec<ScoredChunk>,
}

/// Result of a passage search across one or all documents.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub query: String,
    pub results: Vec<DocumentMatches>,
    pub total_matches: usize,
}

/// Engine-level counters for status displays.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    pub total_documents: usize,
    pub total_chunks: usize,
    pub current_document: Option<String>,
    pub history_length: usize,
    pub embedding_model: String,
    pub generator_model: String,
}

/// Orchestrates the document store, embedder, and generator.
pub struct QaEngine {
    store: DocumentStore,
    embedder: Box<dyn EmbeddingProvider>,
    generator: Box<dyn AnswerGenerator>,
    chunking: ChunkingConfig,
    retrieval: RetrievalConfig,
    generation: GeneratorConfig,
}

impl QaEngine {
    /// Open the store under the configured storage path and assemble the
    /// engine around the given providers.
    pub fn new(
        config: &Config,
        embedder: Box<dyn EmbeddingProvider>,
        generator: Box<dyn AnswerGenerator>,
    ) -> Result<Self, QaError> {
        let store =
            DocumentStore::open(&config.storage.path, embedder.as_ref()).map_err(QaError::Index)?;
        Ok(Self {
            store,
            embedder,
            generator,
            chunking: config.chunking.clone(),
            retrieval: config.retrieval.clone(),
            generation: config.generator.clone(),
        })
    }

    /// Where this engine's session state persists.
    pub fn session_path(&self) -> PathBuf {
        self.store.storage_dir().join("session.json")
    }

    pub fn documents(&self) -> Vec<DocumentInfo> {
        self.store.list()
    }

    /// Ingest a document file. Byte-identical re-uploads resolve to the
    /// same id and are selected without re-indexing (`is_new = false`).
    /// History is cleared whenever the selected document changes.
    pub async fn upload(
        &mut self,
        session: &mut Session,
        path: &Path,
        title: Option<String>,
    ) -> Result<UploadOutcome, QaError> {
        let bytes = std::fs::read(path)
            .map_err(|e| QaError::Extraction(ExtractError::Unreadable(e.to_string())))?;
        let id = document_id(path, &bytes);

        if let Some(record) = self.store.get(&id) {
            tracing::info!(document = %id, "document already indexed");
            let outcome = UploadOutcome {
                document_id: id.clone(),
                is_new: false,
                title: record.metadata.title.clone(),
                page_count: record.metadata.page_count,
                chunk_count: record.index.len(),
            };
            if session.current_document.as_deref() != Some(id.as_str()) {
                session.current_document = Some(id);
                session.history.clear();
            }
            return Ok(outcome);
        }

        let (text, mut metadata) = extract::extract(path).map_err(QaError::Extraction)?;
        if let Some(title) = title {
            metadata.title = title;
        }

        let cleaned = chunk::clean_text(&text);
        let chunks = chunk::chunk_text(&cleaned, self.chunking.chunk_size, self.chunking.overlap);
        tracing::info!(document = %id, chunks = chunks.len(), "document chunked");

        let outcome = UploadOutcome {
            document_id: id.clone(),
            is_new: true,
            title: metadata.title.clone(),
            page_count: metadata.page_count,
            chunk_count: chunks.len(),
        };

        self.store
            .add_document(&id, chunks, metadata, self.embedder.as_ref())
            .await
            .map_err(QaError::Index)?;

        session.current_document = Some(id);
        session.history.clear();
        Ok(outcome)
    }

    /// Select a stored document as current. Always clears history on a
    /// successful switch, since prior conversation no longer applies.
    pub fn select(&self, session: &mut Session, id: &str) -> Result<DocumentInfo, QaError> {
        let record = self
            .store
            .get(id)
            .ok_or_else(|| QaError::NotFound(id.to_string()))?;

        session.current_document = Some(id.to_string());
        session.history.clear();

        Ok(DocumentInfo {
            id: record.id.clone(),
            metadata: record.metadata.clone(),
            chunk_count: record.index.len(),
            created_at: record.created_at,
        })
    }

    /// Answer a question against the selected document.
    ///
    /// Fails only on the retrieval side ([`QaError::NoDocumentSelected`],
    /// [`QaError::NoRelevantContext`], index errors); generator failures
    /// degrade into an apology answer. The exchange is appended to the
    /// session history after generation completes.
    pub async fn ask(
        &self,
        session: &mut Session,
        question: &str,
        k: Option<usize>,
    ) -> Result<AnswerBundle, QaError> {
        let document_id = session
            .current_document
            .clone()
            .ok_or(QaError::NoDocumentSelected)?;
        let k = k.unwrap_or(self.retrieval.top_k);

        let hits = self
            .store
            .search_document(
                &document_id,
                question,
                k,
                self.retrieval.score_threshold,
                self.embedder.as_ref(),
            )
            .await
            .map_err(QaError::Index)?;

        if hits.is_empty() {
            return Err(QaError::NoRelevantContext);
        }

        let document_title = self
            .store
            .get(&document_id)
            .map(|r| r.metadata.title.clone())
            .unwrap_or_else(|| "Document".to_string());

        // Bound the prompt regardless of how many hits the caller asked for.
        let context = &hits[..hits.len().min(self.retrieval.max_context_chunks)];
        let prompt = generator::answer_prompt(question, context, &document_title);

        let (answer, follow_up_questions) = match self
            .generator
            .generate(&prompt, self.generation.max_tokens, self.generation.temperature)
            .await
        {
            Ok(answer) => {
                let follow_ups = self.follow_ups_for(question, &answer).await;
                (answer, follow_ups)
            }
            Err(e) => {
                tracing::warn!(error = %e, "generator failed, returning degraded answer");
                (DEGRADED_ANSWER.to_string(), Vec::new())
            }
        };

        let sources = hits
            .iter()
            .take(MAX_SOURCES)
            .map(|s| SourceRef {
                chunk_id: s.chunk.id,
                similarity_score: s.score,
                preview: preview(&s.chunk.text),
            })
            .collect();

        let timestamp = Utc::now();
        session.history.push(ConversationEntry {
            question: question.to_string(),
            answer: answer.clone(),
            timestamp,
            document_id: document_id.clone(),
        });

        Ok(AnswerBundle {
            question: question.to_string(),
            answer,
            document_id,
            document_title,
            sources,
            follow_up_questions,
            context_chunks_used: context.len(),
            model_used: self.generator.model_name().to_string(),
            timestamp,
        })
    }

    async fn follow_ups_for(&self, question: &str, answer: &str) -> Vec<String> {
        let prompt = generator::follow_up_prompt(question, answer);
        match self
            .generator
            .generate(&prompt, FOLLOW_UP_MAX_TOKENS, self.generation.temperature)
            .await
        {
            Ok(text) => {
                let parsed = generator::parse_follow_ups(&text);
                if parsed.is_empty() {
                    FALLBACK_FOLLOW_UPS.iter().map(|s| s.to_string()).collect()
                } else {
                    parsed
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "follow-up generation failed, using fallbacks");
                FALLBACK_FOLLOW_UPS.iter().map(|s| s.to_string()).collect()
            }
        }
    }

    /// Summarize the leading chunks of a document in document order —
    /// summarization is positional, not similarity-ranked.
    pub async fn summarize(
        &self,
        session: &Session,
        document_id: Option<&str>,
        max_chunks: Option<usize>,
    ) -> Result<SummaryOutcome, QaError> {
        let id = match document_id {
            Some(id) => id.to_string(),
            None => session
                .current_document
                .clone()
                .ok_or(QaError::NoDocumentSelected)?,
        };
        let record = self.store.get(&id).ok_or_else(|| QaError::NotFound(id.clone()))?;

        let max_chunks = max_chunks.unwrap_or(self.retrieval.max_summary_chunks);
        let chunks = &record.index.chunks()[..record.index.len().min(max_chunks)];
        let text: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let prompt = generator::summary_prompt(&text.join(" "), &record.metadata.title);

        let summary = match self
            .generator
            .generate(&prompt, SUMMARY_MAX_TOKENS, self.generation.temperature)
            .await
        {
            Ok(s) if !s.trim().is_empty() => s,
            Ok(_) => DEGRADED_SUMMARY.to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "summary generation failed");
                DEGRADED_SUMMARY.to_string()
            }
        };

        Ok(SummaryOutcome {
            document_id: id,
            title: record.metadata.title.clone(),
            summary,
            chunks_used: chunks.len(),
            total_chunks: record.index.len(),
        })
    }

    /// Search for passages in one document or across all of them.
    pub async fn search(
        &self,
        query: &str,
        document_id: Option<&str>,
        k: Option<usize>,
    ) -> Result<SearchOutcome, QaError> {
        let k = k.unwrap_or(self.retrieval.top_k);
        let threshold = self.retrieval.score_threshold;

        let results: Vec<DocumentMatches> = match document_id {
            Some(id) => {
                let matches = self
                    .store
                    .search_document(id, query, k, threshold, self.embedder.as_ref())
                    .await
                    .map_err(QaError::Index)?;
                if matches.is_empty() {
                    Vec::new()
                } else {
                    vec![DocumentMatches {
                        document_id: id.to_string(),
                        matches,
                    }]
                }
            }
            None => self
                .store
                .search_all_documents(query, k, threshold, self.embedder.as_ref())
                .await
                .map_err(QaError::Index)?
                .into_iter()
                .map(|(document_id, matches)| DocumentMatches {
                    document_id,
                    matches,
                })
                .collect(),
        };

        let total_matches = results.iter().map(|d| d.matches.len()).sum();
        Ok(SearchOutcome {
            query: query.to_string(),
            results,
            total_matches,
        })
    }

    /// Expand search hits with their neighboring chunks.
    pub fn expand_hits(
        &self,
        document_id: &str,
        hits: &[ScoredChunk],
        window: Option<usize>,
    ) -> Vec<ContextChunk> {
        let window = window.unwrap_or(self.retrieval.context_window);
        self.store
            .get(document_id)
            .map(|r| r.index.expand_with_context(hits, window))
            .unwrap_or_default()
    }

    /// The most recent `limit` history entries, oldest first.
    pub fn history<'s>(&self, session: &'s Session, limit: usize) -> &'s [ConversationEntry] {
        let len = session.history.len();
        &session.history[len.saturating_sub(limit)..]
    }

    pub fn clear_history(&self, session: &mut Session) {
        session.history.clear();
    }

    pub fn stats(&self, session: &Session) -> EngineStats {
        EngineStats {
            total_documents: self.store.len(),
            total_chunks: self.store.total_chunks(),
            current_document: session.current_document.clone(),
            history_length: session.history.len(),
            embedding_model: self.embedder.model_name().to_string(),
            generator_model: self.generator.model_name().to_string(),
        }
    }
}

/// Derive a document id from its byte content plus a readable name
/// component, so byte-identical uploads always map to the same id.
fn document_id(path: &Path, bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = format!("{:x}", hasher.finalize());

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document");
    let stem: String = stem
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();

    format!("{}_{}", stem, &digest[..8])
}

fn preview(text: &str) -> String {
    let truncated: String = text.chars().take(PREVIEW_CHARS).collect();
    if text.chars().count() > PREVIEW_CHARS {
        format!("{}...", truncated)
    } else {
        truncated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use crate::index::stub::StubEmbedder;

    use anyhow::Result;
    use async_trait::async_trait;

    struct StubGenerator {
        answer: String,
    }

    #[async_trait]
    impl AnswerGenerator for StubGenerator {
        fn model_name(&self) -> &str {
            "stub-generator"
        }
        async fn generate(&self, _prompt: &str, _max: u32, _temp: f32) -> Result<String> {
            Ok(self.answer.clone())
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl AnswerGenerator for FailingGenerator {
        fn model_name(&self) -> &str {
            "failing-generator"
        }
        async fn generate(&self, _prompt: &str, _max: u32, _temp: f32) -> Result<String> {
            anyhow::bail!("request timed out")
        }
    }

    const BODY: &str = "the quick brown fox jumps over the lazy dog";

    fn test_config(dir: &Path) -> Config {
        Config {
            storage: StorageConfig {
                path: dir.to_path_buf(),
            },
            ..Default::default()
        }
    }

    fn embedder() -> Box<StubEmbedder> {
        Box::new(
            StubEmbedder::new(3)
                .with_preset(BODY, vec![1.0, 0.0, 0.0])
                .with_preset("fox question", vec![1.0, 0.0, 0.0])
                .with_preset("submarine pricing", vec![0.0, 1.0, 0.0]),
        )
    }

    fn write_doc(dir: &Path) -> PathBuf {
        let path = dir.join("animals.txt");
        std::fs::write(&path, BODY).unwrap();
        path
    }

    #[tokio::test]
    async fn ask_without_document_fails() {
        let dir = tempfile::tempdir().unwrap();
        let engine = QaEngine::new(
            &test_config(dir.path()),
            embedder(),
            Box::new(StubGenerator {
                answer: "unused".to_string(),
            }),
        )
        .unwrap();

        let mut session = Session::default();
        let err = engine.ask(&mut session, "anything", None).await.unwrap_err();
        assert!(matches!(err, QaError::NoDocumentSelected));
    }

    #[tokio::test]
    async fn upload_is_idempotent_for_identical_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let docs = tempfile::tempdir().unwrap();
        let mut engine = QaEngine::new(
            &test_config(dir.path()),
            embedder(),
            Box::new(StubGenerator {
                answer: "unused".to_string(),
            }),
        )
        .unwrap();

        let path = write_doc(docs.path());
        let mut session = Session::default();

        let first = engine.upload(&mut session, &path, None).await.unwrap();
        assert!(first.is_new);
        assert_eq!(first.chunk_count, 1);

        let second = engine.upload(&mut session, &path, None).await.unwrap();
        assert!(!second.is_new);
        assert_eq!(second.document_id, first.document_id);
    }

    #[tokio::test]
    async fn ask_answers_with_sources_and_history() {
        let dir = tempfile::tempdir().unwrap();
        let docs = tempfile::tempdir().unwrap();
        let mut engine = QaEngine::new(
            &test_config(dir.path()),
            embedder(),
            Box::new(StubGenerator {
                answer: "It describes a fox.".to_string(),
            }),
        )
        .unwrap();

        let path = write_doc(docs.path());
        let mut session = Session::default();
        engine.upload(&mut session, &path, None).await.unwrap();

        let bundle = engine
            .ask(&mut session, "fox question", None)
            .await
            .unwrap();
        assert_eq!(bundle.answer, "It describes a fox.");
        assert_eq!(bundle.sources.len(), 1);
        assert_eq!(bundle.sources[0].chunk_id, 0);
        assert!(bundle.sources[0].preview.chars().count() <= 103);
        assert_eq!(bundle.context_chunks_used, 1);
        assert_eq!(bundle.model_used, "stub-generator");
        // Unparsable stub answer falls back to the canned follow-ups.
        assert_eq!(bundle.follow_up_questions.len(), 3);

        assert_eq!(session.history.len(), 1);
        assert_eq!(session.history[0].question, "fox question");
    }

    #[tokio::test]
    async fn ask_below_threshold_is_no_relevant_context() {
        let dir = tempfile::tempdir().unwrap();
        let docs = tempfile::tempdir().unwrap();
        let mut engine = QaEngine::new(
            &test_config(dir.path()),
            embedder(),
            Box::new(StubGenerator {
                answer: "unused".to_string(),
            }),
        )
        .unwrap();

        let path = write_doc(docs.path());
        let mut session = Session::default();
        engine.upload(&mut session, &path, None).await.unwrap();

        let err = engine
            .ask(&mut session, "submarine pricing", None)
            .await
            .unwrap_err();
        assert!(matches!(err, QaError::NoRelevantContext));
        assert!(session.history.is_empty());
    }

    #[tokio::test]
    async fn generator_failure_degrades_instead_of_erroring() {
        let dir = tempfile::tempdir().unwrap();
        let docs = tempfile::tempdir().unwrap();
        let mut engine = QaEngine::new(
            &test_config(dir.path()),
            embedder(),
            Box::new(FailingGenerator),
        )
        .unwrap();

        let path = write_doc(docs.path());
        let mut session = Session::default();
        engine.upload(&mut session, &path, None).await.unwrap();

        let bundle = engine
            .ask(&mut session, "fox question", None)
            .await
            .unwrap();
        assert!(bundle.answer.starts_with("I apologize"));
        assert!(bundle.follow_up_questions.is_empty());
        assert_eq!(bundle.sources.len(), 1);
        assert_eq!(session.history.len(), 1);
    }

    #[tokio::test]
    async fn select_clears_history_and_rejects_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let docs = tempfile::tempdir().unwrap();
        let mut engine = QaEngine::new(
            &test_config(dir.path()),
            embedder(),
            Box::new(StubGenerator {
                answer: "An answer.".to_string(),
            }),
        )
        .unwrap();

        let path = write_doc(docs.path());
        let mut session = Session::default();
        let uploaded = engine.upload(&mut session, &path, None).await.unwrap();
        engine.ask(&mut session, "fox question", None).await.unwrap();
        assert_eq!(session.history.len(), 1);

        engine.select(&mut session, &uploaded.document_id).unwrap();
        assert!(session.history.is_empty());
        assert_eq!(
            session.current_document.as_deref(),
            Some(uploaded.document_id.as_str())
        );

        let err = engine.select(&mut session, "missing-doc").unwrap_err();
        assert!(matches!(err, QaError::NotFound(_)));
    }

    #[tokio::test]
    async fn summarize_uses_leading_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let docs = tempfile::tempdir().unwrap();
        let mut engine = QaEngine::new(
            &test_config(dir.path()),
            embedder(),
            Box::new(StubGenerator {
                answer: "A document about animals.".to_string(),
            }),
        )
        .unwrap();

        let path = write_doc(docs.path());
        let mut session = Session::default();
        engine.upload(&mut session, &path, None).await.unwrap();

        let summary = engine.summarize(&session, None, None).await.unwrap();
        assert_eq!(summary.summary, "A document about animals.");
        assert_eq!(summary.chunks_used, 1);
        assert_eq!(summary.total_chunks, 1);
    }

    #[tokio::test]
    async fn search_reports_total_matches() {
        let dir = tempfile::tempdir().unwrap();
        let docs = tempfile::tempdir().unwrap();
        let mut engine = QaEngine::new(
            &test_config(dir.path()),
            embedder(),
            Box::new(StubGenerator {
                answer: "unused".to_string(),
            }),
        )
        .unwrap();

        let path = write_doc(docs.path());
        let mut session = Session::default();
        engine.upload(&mut session, &path, None).await.unwrap();

        let outcome = engine.search("fox question", None, None).await.unwrap();
        assert_eq!(outcome.total_matches, 1);
        assert_eq!(outcome.results.len(), 1);

        let empty = engine
            .search("submarine pricing", None, None)
            .await
            .unwrap();
        assert_eq!(empty.total_matches, 0);
        assert!(empty.results.is_empty());
    }

    #[test]
    fn document_ids_are_content_derived() {
        let a = document_id(Path::new("/tmp/My Notes.pdf"), b"same bytes");
        let b = document_id(Path::new("/tmp/My Notes.pdf"), b"same bytes");
        let c = document_id(Path::new("/tmp/My Notes.pdf"), b"other bytes");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("my-notes_"));
    }

    #[test]
    fn previews_truncate_to_one_hundred_chars() {
        let long = "y".repeat(250);
        let p = preview(&long);
        assert_eq!(p.chars().count(), 103);
        assert!(p.ends_with("..."));
        assert_eq!(preview("short"), "short");
    }
}
