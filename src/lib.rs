//! # docquery
//!
//! A local-first document question-answering engine.
//!
//! docquery ingests documents (PDF or plain text), chunks and embeds them
//! into per-document vector indices, and answers natural-language
//! questions from retrieved passages plus an external language model,
//! attaching cited sources and suggested follow-ups to every answer.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────────┐   ┌───────────────┐
//! │ extract  │──▶│ clean + chunk │──▶│  VectorIndex   │
//! │ PDF/text │   │               │   │ embed + store │
//! └──────────┘   └───────────────┘   └──────┬────────┘
//!                                          │
//!                    ┌─────────────────────┤
//!                    ▼                     ▼
//!               ┌──────────┐        ┌────────────┐
//!               │ QaEngine │───────▶│ generator   │
//!               │ ask/sum  │        │ Ollama/API │
//!               └──────────┘        └────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! dq upload notes.pdf           # ingest and select a document
//! dq ask "what is covered?"     # answer with sources + follow-ups
//! dq search "deployment"        # passage search across documents
//! dq summarize                  # document-order summary
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`extract`] | PDF/plain-text extraction |
//! | [`chunk`] | Text cleaning and chunking |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`index`] | Per-document vector index |
//! | [`store`] | Document registry and persistence |
//! | [`generator`] | Answer generation and prompts |
//! | [`qa`] | Session and QA orchestration |

pub mod chunk;
pub mod config;
pub mod embedding;
pub mod extract;
pub mod generator;
pub mod index;
pub mod models;
pub mod qa;
pub mod store;
