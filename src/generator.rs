//! Answer generation through an external language model.
//!
//! Defines the [`AnswerGenerator`] trait plus Ollama and OpenAI backends,
//! and the prompt templates used for question answering, follow-up
//! suggestion, and summarization. Context passages are labeled
//! `[Context N]` and every prompt instructs the model to admit when the
//! context is insufficient rather than fabricate.
//!
//! Generation failures are the caller's problem by design: providers
//! return errors, and the QA layer converts them into degraded answers.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::time::Duration;

use crate::config::GeneratorConfig;
use crate::models::ScoredChunk;

/// Token budget for follow-up question generation.
pub const FOLLOW_UP_MAX_TOKENS: u32 = 150;
/// Token budget for summaries.
pub const SUMMARY_MAX_TOKENS: u32 = 200;
/// Character cap on text handed to the summary prompt.
const SUMMARY_INPUT_CHARS: usize = 2000;

/// Canned follow-ups used when follow-up generation fails or returns
/// nothing usable.
pub const FALLBACK_FOLLOW_UPS: [&str; 3] = [
    "Can you explain this concept in more detail?",
    "What are some related topics I should study?",
    "Can you provide an example to illustrate this?",
];

/// A text generation backend.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// Model identifier reported in answer bundles.
    fn model_name(&self) -> &str;
    /// Generate a completion for `prompt`.
    async fn generate(&self, prompt: &str, max_tokens: u32, temperature: f32) -> Result<String>;
}

/// Create the configured [`AnswerGenerator`].
pub fn create_generator(config: &GeneratorConfig) -> Result<Box<dyn AnswerGenerator>> {
    match config.provider.as_str() {
        "ollama" => Ok(Box::new(OllamaGenerator::new(config))),
        "openai" => Ok(Box::new(OpenAiGenerator::new(config)?)),
        other => bail!("Unknown generator provider: {}", other),
    }
}

// ============ Ollama ============

/// Generator backed by a local Ollama instance (`POST {url}/api/generate`,
/// non-streaming).
pub struct OllamaGenerator {
    model: String,
    url: String,
    max_retries: u32,
    timeout: Duration,
}

impl OllamaGenerator {
    pub fn new(config: &GeneratorConfig) -> Self {
        Self {
            model: config.model.clone(),
            url: config
                .url
                .clone()
                .unwrap_or_else(|| "http://localhost:11434".to_string()),
            max_retries: config.max_retries,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

#[async_trait]
impl AnswerGenerator for OllamaGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, max_tokens: u32, temperature: f32) -> Result<String> {
        let client = reqwest::Client::builder().timeout(self.timeout).build()?;
        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": { "num_predict": max_tokens, "temperature": temperature },
        });

        let mut last_err = None;
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                tokio::time::sleep(backoff_delay(attempt)).await;
            }

            let resp = client
                .post(format!("{}/api/generate", self.url))
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let json: serde_json::Value = response.json().await?;
                        let text = json
                            .get("response")
                            .and_then(|r| r.as_str())
                            .ok_or_else(|| {
                                anyhow::anyhow!("Invalid Ollama response: missing response field")
                            })?;
                        return Ok(text.trim().to_string());
                    }
                    let text = response.text().await.unwrap_or_default();
                    if status.as_u16() == 429 || status.is_server_error() {
                        last_err = Some(anyhow::anyhow!("Ollama API error {}: {}", status, text));
                        continue;
                    }
                    bail!("Ollama API error {}: {}", status, text);
                }
                Err(e) => {
                    last_err = Some(anyhow::anyhow!(
                        "Ollama connection error (is Ollama running at {}?): {}",
                        self.url,
                        e
                    ));
                    continue;
                }
            }
        }
        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("generation failed after retries")))
    }
}

// ============ OpenAI ============

/// Generator backed by the OpenAI chat completions API.
///
/// Requires the `OPENAI_API_KEY` environment variable.
pub struct OpenAiGenerator {
    model: String,
    max_retries: u32,
    timeout: Duration,
}

impl OpenAiGenerator {
    pub fn new(config: &GeneratorConfig) -> Result<Self> {
        if std::env::var("OPENAI_API_KEY").is_err() {
            bail!("OPENAI_API_KEY environment variable not set");
        }
        Ok(Self {
            model: config.model.clone(),
            max_retries: config.max_retries,
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }
}

#[async_trait]
impl AnswerGenerator for OpenAiGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, max_tokens: u32, temperature: f32) -> Result<String> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY not set"))?;
        let client = reqwest::Client::builder().timeout(self.timeout).build()?;
        let body = serde_json::json!({
            "model": self.model,
            "messages": [ { "role": "user", "content": prompt } ],
            "max_tokens": max_tokens,
            "temperature": temperature,
        });

        let mut last_err = None;
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                tokio::time::sleep(backoff_delay(attempt)).await;
            }

            let resp = client
                .post("https://api.openai.com/v1/chat/completions")
                .header("Authorization", format!("Bearer {}", api_key))
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let json: serde_json::Value = response.json().await?;
                        let text = json
                            .pointer("/choices/0/message/content")
                            .and_then(|c| c.as_str())
                            .ok_or_else(|| {
                                anyhow::anyhow!("Invalid OpenAI response: missing message content")
                            })?;
                        return Ok(text.trim().to_string());
                    }
                    let text = response.text().await.unwrap_or_default();
                    if status.as_u16() == 429 || status.is_server_error() {
                        last_err = Some(anyhow::anyhow!("OpenAI API error {}: {}", status, text));
                        continue;
                    }
                    bail!("OpenAI API error {}: {}", status, text);
                }
                Err(e) => {
                    last_err = Some(e.into());
                    continue;
                }
            }
        }
        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("generation failed after retries")))
    }
}

fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(1 << (attempt - 1).min(5))
}

// ============ Prompt templates ============

/// Build the question-answering prompt from retrieved context.
///
/// The caller bounds `context` (at most the top few chunks); each passage
/// becomes a `[Context N]` block in rank order.
pub fn answer_prompt(question: &str, context: &[ScoredChunk], document_title: &str) -> String {
    let mut context_text = String::new();
    for (i, scored) in context.iter().enumerate() {
        context_text.push_str(&format!("[Context {}]\n{}\n\n", i + 1, scored.chunk.text));
    }

    format!(
        "You are a study assistant that helps readers understand their documents. \
You have been provided with relevant excerpts from \"{document_title}\" to answer the reader's question.

Context from the document:
{context_text}
Reader's Question: {question}

Instructions:
- Provide a clear, accurate answer based on the provided context
- Reference specific information from the context when relevant
- If the context doesn't contain enough information, say so honestly
- Keep your answer concise but comprehensive

Answer:"
    )
}

/// Build the follow-up-question prompt from a completed exchange.
pub fn follow_up_prompt(question: &str, answer: &str) -> String {
    format!(
        "Based on this Q&A interaction, generate 3 relevant follow-up questions \
that would help the reader deepen their understanding:

Original Question: {question}
Answer: {answer}

Generate 3 follow-up questions, one per line, numbered:
1."
    )
}

/// Build the summarization prompt over document text (capped to the first
/// 2000 characters).
pub fn summary_prompt(text: &str, document_title: &str) -> String {
    let bounded: String = text.chars().take(SUMMARY_INPUT_CHARS).collect();
    format!(
        "Please provide a concise summary of the following text from \"{document_title}\":

{bounded}

Summary:"
    )
}

/// Extract up to three follow-up questions from generated text.
///
/// Accepts numbered (`1.`) and dashed (`-`) list lines; anything 10
/// characters or shorter is discarded as noise.
pub fn parse_follow_ups(response: &str) -> Vec<String> {
    let mut questions = Vec::new();
    for line in response.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let candidate = if let Some(rest) = strip_number_prefix(line) {
            rest
        } else if let Some(rest) = line.strip_prefix('-') {
            rest.trim()
        } else {
            continue;
        };

        if candidate.chars().count() > 10 {
            questions.push(candidate.to_string());
        }
        if questions.len() == 3 {
            break;
        }
    }
    questions
}

fn strip_number_prefix(line: &str) -> Option<&str> {
    let rest = line.strip_prefix(|c: char| c.is_ascii_digit())?;
    let rest = rest.strip_prefix('.')?;
    Some(rest.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Chunk;

    fn scored(id: usize, text: &str) -> ScoredChunk {
        ScoredChunk {
            chunk: Chunk {
                id,
                text: text.to_string(),
                start_pos: 0,
                end_pos: text.len(),
                length: text.len(),
            },
            score: 0.9,
            rank: id + 1,
        }
    }

    #[test]
    fn answer_prompt_labels_context_blocks() {
        let context = vec![scored(0, "First passage."), scored(1, "Second passage.")];
        let prompt = answer_prompt("What is this?", &context, "My Notes");
        assert!(prompt.contains("[Context 1]\nFirst passage."));
        assert!(prompt.contains("[Context 2]\nSecond passage."));
        assert!(prompt.contains("Reader's Question: What is this?"));
        assert!(prompt.contains("\"My Notes\""));
        assert!(prompt.contains("say so honestly"));
    }

    #[test]
    fn summary_prompt_caps_input_length() {
        let text = "x".repeat(5000);
        let prompt = summary_prompt(&text, "Doc");
        let x_run = prompt.chars().filter(|c| *c == 'x').count();
        assert_eq!(x_run, 2000);
    }

    #[test]
    fn parses_numbered_follow_ups() {
        let response = "1. What causes the effect described here?\n\
                        2. How does this compare to the earlier section?\n\
                        3. Why does the author emphasize this point?";
        let parsed = parse_follow_ups(response);
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[0], "What causes the effect described here?");
    }

    #[test]
    fn parses_dashed_follow_ups() {
        let response = "- Where is this concept applied in practice?\n- too short";
        let parsed = parse_follow_ups(response);
        assert_eq!(parsed, vec!["Where is this concept applied in practice?"]);
    }

    #[test]
    fn caps_follow_ups_at_three() {
        let response = "1. A sufficiently long question one?\n\
                        2. A sufficiently long question two?\n\
                        3. A sufficiently long question three?\n\
                        4. A sufficiently long question four?";
        assert_eq!(parse_follow_ups(response).len(), 3);
    }

    #[test]
    fn ignores_prose_lines() {
        let response = "Here are some ideas you might consider asking about next.";
        assert!(parse_follow_ups(response).is_empty());
    }
}
