// Chunking module
// Splits documents into ordered, deterministically named chunks

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::docstore::{Chunk, Document};

/// Configuration for document splitting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Target chunk size in estimated tokens
    pub chunk_size: usize,
    /// Tokens repeated from the end of the previous chunk
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            chunk_size: 512,
            chunk_overlap: 32,
        }
    }
}

/// Split a document into ordered chunks with ids `{doc_id}-{index}`.
///
/// Paragraphs are packed up to `chunk_size`; oversized paragraphs fall back to
/// sentence and then word boundaries.
#[inline]
pub fn split_document(document: &Document, config: &ChunkingConfig) -> Vec<Chunk> {
    let mut splits = split_by_paragraphs(&document.text, config);

    if config.chunk_overlap > 0 {
        add_overlap(&mut splits, config.chunk_overlap);
    }

    let chunks: Vec<Chunk> = splits
        .into_iter()
        .enumerate()
        .map(|(i, text)| {
            Chunk::with_id(format!("{}-{}", document.id, i), text).with_ref_doc_id(&document.id)
        })
        .collect();

    debug!(
        "Split document {} into {} chunks",
        document.id,
        chunks.len()
    );

    chunks
}

fn split_by_paragraphs(content: &str, config: &ChunkingConfig) -> Vec<String> {
    let mut packer = Packer::new(config.chunk_size, "\n\n");

    for paragraph in content.split("\n\n") {
        if paragraph.trim().is_empty() {
            continue;
        }

        if estimate_token_count(paragraph) > config.chunk_size {
            for piece in split_by_sentences(paragraph, config) {
                packer.push(&piece);
            }
        } else {
            packer.push(paragraph.trim());
        }
    }

    packer.finish()
}

fn split_by_sentences(text: &str, config: &ChunkingConfig) -> Vec<String> {
    let mut packer = Packer::new(config.chunk_size, " ");

    for sentence in split_sentences(text) {
        if estimate_token_count(sentence) > config.chunk_size {
            for piece in split_by_words(sentence, config) {
                packer.push(&piece);
            }
        } else {
            packer.push(sentence);
        }
    }

    packer.finish()
}

fn split_by_words(text: &str, config: &ChunkingConfig) -> Vec<String> {
    let mut packer = Packer::new(config.chunk_size, " ");
    for word in text.split_whitespace() {
        packer.push(word);
    }
    packer.finish()
}

/// Sentences keep their terminating punctuation.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;

    for (i, c) in text.char_indices() {
        if matches!(c, '.' | '!' | '?') {
            let end = i + c.len_utf8();
            if let Some(sentence) = text.get(start..end) {
                let sentence = sentence.trim();
                if !sentence.is_empty() {
                    sentences.push(sentence);
                }
            }
            start = end;
        }
    }

    if let Some(rest) = text.get(start..) {
        let rest = rest.trim();
        if !rest.is_empty() {
            sentences.push(rest);
        }
    }

    sentences
}

/// Greedily packs pieces into splits no larger than the target size.
struct Packer {
    target: usize,
    separator: &'static str,
    current: String,
    splits: Vec<String>,
}

impl Packer {
    fn new(target: usize, separator: &'static str) -> Self {
        Self {
            target,
            separator,
            current: String::new(),
            splits: Vec::new(),
        }
    }

    fn push(&mut self, piece: &str) {
        if !self.current.is_empty() {
            let combined = format!("{}{}{}", self.current, self.separator, piece);
            if estimate_token_count(&combined) > self.target {
                self.splits.push(std::mem::take(&mut self.current));
            } else {
                self.current = combined;
                return;
            }
        }
        self.current.push_str(piece);
    }

    fn finish(mut self) -> Vec<String> {
        if !self.current.trim().is_empty() {
            self.splits.push(self.current);
        }
        self.splits
    }
}

/// Prefix each split with the tail of the previous one
fn add_overlap(splits: &mut [String], overlap_tokens: usize) {
    for i in (1..splits.len()).rev() {
        let overlap_text = extract_overlap_text(&splits[i - 1], overlap_tokens);
        if !overlap_text.is_empty() {
            splits[i] = format!("{} {}", overlap_text, splits[i]);
        }
    }
}

/// Extract overlap text from the end of a chunk
fn extract_overlap_text(content: &str, overlap_tokens: usize) -> String {
    let words: Vec<&str> = content.split_whitespace().collect();
    let word_count = (overlap_tokens as f64 * 0.75) as usize; // Rough word-to-token ratio

    if word_count == 0 || words.len() <= word_count {
        return String::new();
    }

    words[words.len() - word_count..].join(" ")
}

/// Estimate token count using a simple heuristic
/// This is a rough approximation - actual tokenization would be more accurate
#[inline]
pub fn estimate_token_count(text: &str) -> usize {
    // Rough heuristic: 1 token ≈ 0.75 words for English text
    // Add extra tokens for punctuation and special characters
    let word_count = text.split_whitespace().count();
    let punct_count = text.chars().filter(|c| c.is_ascii_punctuation()).count();

    (punct_count as f64).mul_add(0.1, word_count as f64 / 0.75) as usize
}
