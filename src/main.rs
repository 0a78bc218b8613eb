//! # docquery CLI (`dq`)
//!
//! The `dq` binary is the interface to the question-answering engine. The
//! selected document and conversation history persist in the storage
//! directory, so a session spans invocations.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `dq upload <file>` | Ingest a PDF or text file and select it |
//! | `dq ask "<question>"` | Answer a question from the selected document |
//! | `dq search "<query>"` | Passage search in one or all documents |
//! | `dq summarize` | Summarize the selected document |
//! | `dq docs` | List stored documents |
//! | `dq select <id>` | Switch the selected document |
//! | `dq history` | Show recent Q&A exchanges |
//! | `dq stats` | Engine counters and model names |

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use docquery::config::{self, Config};
use docquery::embedding;
use docquery::generator;
use docquery::qa::{QaEngine, QaError, Session};

/// docquery — a local-first document question-answering engine.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file; defaults apply when the file does not exist.
#[derive(Parser)]
#[command(
    name = "dq",
    about = "docquery — ask questions about your documents",
    version,
    long_about = "docquery ingests documents into per-document vector indices and answers \
    natural-language questions from retrieved passages plus a language model, with cited \
    sources and follow-up suggestions."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/dq.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Ingest a document file and select it.
    ///
    /// Re-uploading byte-identical content is a no-op: the existing
    /// document is selected without re-indexing.
    Upload {
        /// Path to a `.pdf`, `.txt`, or `.md` file.
        file: PathBuf,

        /// Override the document title from the file's own metadata.
        #[arg(long)]
        title: Option<String>,
    },

    /// Ask a question about the selected document.
    ///
    /// Retrieves the most similar chunks, generates an answer with cited
    /// sources, and suggests follow-up questions.
    Ask {
        /// The question text.
        question: String,

        /// Number of chunks to retrieve.
        #[arg(short, long)]
        k: Option<usize>,
    },

    /// Search for relevant passages.
    ///
    /// Searches the given document, or fans out across all stored
    /// documents when `--doc` is omitted.
    Search {
        /// The search query string.
        query: String,

        /// Restrict the search to one document id.
        #[arg(long)]
        doc: Option<String>,

        /// Also print surrounding chunks within this window of each hit.
        #[arg(long)]
        context: Option<usize>,

        /// Number of chunks to retrieve per document.
        #[arg(short, long)]
        k: Option<usize>,
    },

    /// Summarize a document from its leading chunks, in document order.
    Summarize {
        /// Document id (defaults to the selected document).
        #[arg(long)]
        doc: Option<String>,

        /// Number of leading chunks to summarize.
        #[arg(long)]
        max_chunks: Option<usize>,
    },

    /// List stored documents.
    Docs,

    /// Select a stored document as current.
    ///
    /// Switching documents clears the conversation history.
    Select {
        /// Document id from `dq docs`.
        id: String,
    },

    /// Show recent conversation history.
    History {
        /// Maximum entries to show.
        #[arg(long, default_value_t = 10)]
        limit: usize,

        /// Clear the history instead of showing it.
        #[arg(long)]
        clear: bool,
    },

    /// Show engine counters and configured models.
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = if cli.config.exists() {
        config::load_config(&cli.config)?
    } else {
        Config::default()
    };

    let embedder = embedding::create_embedder(&config.embedding)?;
    let generator = generator::create_generator(&config.generator)?;
    let mut engine = QaEngine::new(&config, embedder, generator)?;

    let session_path = engine.session_path();
    let mut session = Session::load(&session_path);

    match cli.command {
        Commands::Upload { file, title } => {
            let outcome = engine.upload(&mut session, &file, title).await?;
            if outcome.is_new {
                println!("uploaded {}", outcome.document_id);
            } else {
                println!("already indexed, selected {}", outcome.document_id);
            }
            println!("  title:  {}", outcome.title);
            if outcome.page_count > 0 {
                println!("  pages:  {}", outcome.page_count);
            }
            println!("  chunks: {}", outcome.chunk_count);
        }

        Commands::Ask { question, k } => match engine.ask(&mut session, &question, k).await {
            Ok(bundle) => {
                println!("{}", bundle.answer);
                println!();
                println!("--- Sources ({}) ---", bundle.sources.len());
                for source in &bundle.sources {
                    println!(
                        "[chunk {}] ({:.2}) \"{}\"",
                        source.chunk_id, source.similarity_score, source.preview
                    );
                }
                if !bundle.follow_up_questions.is_empty() {
                    println!();
                    println!("--- Follow-ups ---");
                    for (i, q) in bundle.follow_up_questions.iter().enumerate() {
                        println!("{}. {}", i + 1, q);
                    }
                }
                println!();
                println!("model: {}", bundle.model_used);
            }
            Err(QaError::NoRelevantContext) => {
                println!("No relevant information found in the document.");
            }
            Err(e) => return Err(e.into()),
        },

        Commands::Search {
            query,
            doc,
            context,
            k,
        } => {
            let outcome = engine.search(&query, doc.as_deref(), k).await?;
            if outcome.results.is_empty() {
                println!("No results.");
            } else {
                for doc_matches in &outcome.results {
                    println!("--- {} ---", doc_matches.document_id);
                    for m in &doc_matches.matches {
                        let excerpt: String = m.chunk.text.chars().take(120).collect();
                        println!("{}. [{:.2}] \"{}\"", m.rank, m.score, excerpt);
                    }
                    if context.is_some() {
                        let expanded =
                            engine.expand_hits(&doc_matches.document_id, &doc_matches.matches, context);
                        println!("    context window:");
                        for c in expanded {
                            let marker = if c.is_context { " " } else { "*" };
                            let excerpt: String = c.chunk.text.chars().take(80).collect();
                            println!("    {}[chunk {}] {}", marker, c.chunk.id, excerpt);
                        }
                    }
                    println!();
                }
                println!("total matches: {}", outcome.total_matches);
            }
        }

        Commands::Summarize { doc, max_chunks } => {
            let outcome = engine
                .summarize(&session, doc.as_deref(), max_chunks)
                .await?;
            println!("--- {} ---", outcome.title);
            println!("{}", outcome.summary);
            println!();
            println!(
                "summarized {} of {} chunks",
                outcome.chunks_used, outcome.total_chunks
            );
        }

        Commands::Docs => {
            let documents = engine.documents();
            if documents.is_empty() {
                println!("No documents. Use `dq upload <file>` first.");
            } else {
                for doc in documents {
                    let selected = session.current_document.as_deref() == Some(doc.id.as_str());
                    let marker = if selected { "*" } else { " " };
                    println!("{} {}", marker, doc.id);
                    println!("    title:   {}", doc.metadata.title);
                    println!("    chunks:  {}", doc.chunk_count);
                    println!("    added:   {}", doc.created_at.format("%Y-%m-%d %H:%M"));
                }
            }
        }

        Commands::Select { id } => {
            let info = engine.select(&mut session, &id)?;
            println!("selected {}", info.id);
            println!("  title: {}", info.metadata.title);
        }

        Commands::History { limit, clear } => {
            if clear {
                engine.clear_history(&mut session);
                println!("history cleared");
            } else {
                let entries = engine.history(&session, limit);
                if entries.is_empty() {
                    println!("No history.");
                }
                for entry in entries {
                    println!("[{}] Q: {}", entry.timestamp.format("%H:%M:%S"), entry.question);
                    println!("    A: {}", entry.answer);
                }
            }
        }

        Commands::Stats => {
            let stats = engine.stats(&session);
            println!("documents:  {}", stats.total_documents);
            println!("chunks:     {}", stats.total_chunks);
            println!(
                "selected:   {}",
                stats.current_document.as_deref().unwrap_or("(none)")
            );
            println!("history:    {}", stats.history_length);
            println!("embedder:   {}", stats.embedding_model);
            println!("generator:  {}", stats.generator_model);
        }
    }

    session.save(&session_path)?;
    Ok(())
}
