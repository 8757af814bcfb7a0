//! Character-bounded document splitter.
//!
//! Splits a [`Document`]'s text into chunks that respect a configurable
//! character budget so each chunk fits the embedding backend's input
//! limits. Splitting occurs on paragraph boundaries (`\n\n`) where
//! possible, with no overlap; every output chunk carries the exact
//! metadata of its source document.

use tracing::debug;

use crate::models::Document;

/// Split each document into chunks of at most `chunk_size` characters.
///
/// Documents under the budget pass through as a single chunk. Returns at
/// least one chunk per input document.
pub fn split_documents(documents: &[Document], chunk_size: usize) -> Vec<Document> {
    let mut out = Vec::with_capacity(documents.len());
    for doc in documents {
        for piece in split_text(&doc.page_content, chunk_size) {
            out.push(Document {
                page_content: piece,
                metadata: doc.metadata.clone(),
            });
        }
    }
    debug!(
        documents = documents.len(),
        chunks = out.len(),
        chunk_size,
        "split documents"
    );
    out
}

/// Split text into pieces of at most `max_chars` characters, preferring
/// paragraph boundaries. Returns at least one piece.
fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut pieces = Vec::new();
    let mut current = String::new();

    for para in text.split("\n\n") {
        let trimmed = para.trim();
        if trimmed.is_empty() {
            continue;
        }

        let para_len = trimmed.chars().count();
        let current_len = current.chars().count();

        // Flush the buffer if this paragraph would push it over budget.
        let would_be = if current.is_empty() {
            para_len
        } else {
            current_len + 2 + para_len
        };
        if would_be > max_chars && !current.is_empty() {
            pieces.push(std::mem::take(&mut current));
        }

        if para_len > max_chars {
            // A single oversized paragraph gets hard-split at word
            // boundaries where possible.
            if !current.is_empty() {
                pieces.push(std::mem::take(&mut current));
            }
            hard_split(trimmed, max_chars, &mut pieces);
        } else {
            if !current.is_empty() {
                current.push_str("\n\n");
            }
            current.push_str(trimmed);
        }
    }

    if !current.is_empty() {
        pieces.push(current);
    }
    if pieces.is_empty() {
        pieces.push(text.trim().to_string());
    }

    pieces
}

/// Hard-split an oversized paragraph into `max_chars`-sized pieces,
/// backing up to the nearest newline or space when one exists.
fn hard_split(text: &str, max_chars: usize, out: &mut Vec<String>) {
    let mut remaining = text;
    while !remaining.is_empty() {
        let char_count = remaining.chars().count();
        if char_count <= max_chars {
            let piece = remaining.trim();
            if !piece.is_empty() {
                out.push(piece.to_string());
            }
            break;
        }

        // Byte offset of the max_chars-th character; always a char boundary.
        let limit = remaining
            .char_indices()
            .nth(max_chars)
            .map(|(i, _)| i)
            .unwrap_or(remaining.len());

        let split_at = remaining[..limit]
            .rfind('\n')
            .or_else(|| remaining[..limit].rfind(' '))
            .map(|pos| pos + 1)
            .unwrap_or(limit);

        let piece = remaining[..split_at].trim();
        if !piece.is_empty() {
            out.push(piece.to_string());
        }
        remaining = &remaining[split_at..];
    }
}
