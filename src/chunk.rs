//! Sentence-boundary text chunker.
//!
//! Splits cleaned document text into overlapping [`Chunk`]s of a target
//! character length. Chunk ends snap backward to the nearest sentence
//! terminator when one falls past the window midpoint, so chunks avoid
//! splitting mid-sentence while staying bounded in size.
//!
//! [`clean_text`] is the preprocessing contract callers apply before
//! chunking: artifact lines dropped, odd characters stripped, whitespace
//! collapsed.

use crate::models::Chunk;

/// Characters treated as sentence terminators when snapping chunk ends.
const SENTENCE_TERMINATORS: [char; 3] = ['.', '!', '?'];

/// Lines at or below this length are treated as artifacts (page numbers,
/// running headers) and dropped during cleaning.
const MIN_LINE_CHARS: usize = 10;

/// Normalize raw extracted text for chunking.
///
/// Drops short artifact lines, strips characters outside
/// word/whitespace/basic punctuation, and collapses whitespace runs into
/// single spaces.
pub fn clean_text(raw: &str) -> String {
    let mut kept = String::new();
    for line in raw.lines() {
        let line = line.trim();
        if line.chars().count() <= MIN_LINE_CHARS {
            continue;
        }
        if !kept.is_empty() {
            kept.push(' ');
        }
        kept.push_str(line);
    }

    let filtered: String = kept
        .chars()
        .filter(|c| {
            c.is_alphanumeric() || *c == '_' || c.is_whitespace() || ".,!?;:-()".contains(*c)
        })
        .collect();

    filtered.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split text into overlapping chunks of roughly `chunk_size` characters.
///
/// Positions are character offsets. Each window's end snaps back to just
/// past the last sentence terminator in the window, but only when that
/// terminator lies beyond the window midpoint — this bounds chunks to
/// `[chunk_size/2, chunk_size]` characters whenever a qualifying boundary
/// exists and falls back to the raw window otherwise.
///
/// A full raw window advances by `chunk_size - overlap`, so consecutive
/// windows share `overlap` characters. A snapped window advances by
/// `max(start + chunk_size - overlap, end)`, which keeps forward progress
/// even when the end snapped well before the regular step. The window
/// that reaches the end of the text is always the last.
///
/// Empty text yields no chunks; text shorter than `chunk_size` yields one.
/// Ids are assigned sequentially from 0 in emission order.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<Chunk> {
    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();

    let mut chunks = Vec::new();
    let mut start = 0usize;
    let mut id = 0usize;

    while start < total {
        let raw_end = (start + chunk_size).min(total);
        let mut end = raw_end;

        if end < total {
            let terminator = chars[start..end]
                .iter()
                .rposition(|c| SENTENCE_TERMINATORS.contains(c));
            if let Some(offset) = terminator {
                let boundary = start + offset;
                if boundary > start + chunk_size / 2 {
                    end = boundary + 1;
                }
            }
        }

        let piece: String = chars[start..end].iter().collect();
        let trimmed = piece.trim();
        if !trimmed.is_empty() {
            chunks.push(Chunk {
                id,
                text: trimmed.to_string(),
                start_pos: start,
                end_pos: end,
                length: end - start,
            });
            id += 1;
        }

        let step = start + chunk_size.saturating_sub(overlap).max(1);
        start = if raw_end == total {
            total
        } else if end < raw_end {
            step.max(end)
        } else {
            step
        };
    }

    chunks
}
