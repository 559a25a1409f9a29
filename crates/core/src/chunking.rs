use crate::error::IngestError;
use crate::models::{IngestionOptions, TextChunk};
use regex::Regex;
use sha2::{Digest, Sha256};
use std::collections::VecDeque;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkingConfig {
    pub separator: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl From<&IngestionOptions> for ChunkingConfig {
    fn from(value: &IngestionOptions) -> Self {
        Self {
            separator: value.separator.clone(),
            chunk_size: value.chunk_size,
            chunk_overlap: value.chunk_overlap,
        }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<(), IngestError> {
        if self.chunk_size == 0 {
            return Err(IngestError::InvalidChunkConfig(
                "chunk size must be greater than zero".to_string(),
            ));
        }

        if self.chunk_overlap >= self.chunk_size {
            return Err(IngestError::InvalidChunkConfig(format!(
                "chunk overlap {} must be smaller than chunk size {}",
                self.chunk_overlap, self.chunk_size
            )));
        }

        Ok(())
    }
}

/// Collapses runs of inline whitespace matched by `pattern` into one space.
/// Line breaks are left alone so separators spanning lines still match.
pub fn collapse_inline_whitespace(text: &str, pattern: &Regex) -> String {
    pattern.replace_all(text, " ").trim().to_string()
}

/// Splits `text` on the configured separator and greedily merges the pieces
/// back into chunks of at most `chunk_size` characters, carrying up to
/// `chunk_overlap` characters of trailing pieces into the next chunk.
pub fn split_text(text: &str, config: &ChunkingConfig) -> Result<Vec<String>, IngestError> {
    config.validate()?;

    let splits: Vec<String> = if config.separator.is_empty() {
        text.chars().map(String::from).collect()
    } else {
        text.split(config.separator.as_str())
            .filter(|piece| !piece.is_empty())
            .map(str::to_string)
            .collect()
    };

    Ok(merge_splits(&splits, config))
}

fn merge_splits(splits: &[String], config: &ChunkingConfig) -> Vec<String> {
    let separator_len = config.separator.chars().count();
    let joiner = |pieces: usize| if pieces > 0 { separator_len } else { 0 };

    let mut chunks = Vec::new();
    let mut current: VecDeque<&str> = VecDeque::new();
    let mut total = 0usize;

    for split in splits {
        let len = split.chars().count();

        if total + len + joiner(current.len()) > config.chunk_size {
            if total > config.chunk_size {
                warn!(
                    chunk_len = total,
                    chunk_size = config.chunk_size,
                    "created a chunk longer than the configured size"
                );
            }

            if !current.is_empty() {
                if let Some(chunk) = join_pieces(&current, &config.separator) {
                    chunks.push(chunk);
                }

                while total > config.chunk_overlap
                    || (total > 0 && total + len + joiner(current.len()) > config.chunk_size)
                {
                    let Some(first) = current.pop_front() else {
                        break;
                    };
                    let trailing = if current.is_empty() { 0 } else { separator_len };
                    total = total.saturating_sub(first.chars().count() + trailing);
                }
            }
        }

        current.push_back(split.as_str());
        total += len + if current.len() > 1 { separator_len } else { 0 };
    }

    if let Some(chunk) = join_pieces(&current, &config.separator) {
        chunks.push(chunk);
    }

    chunks
}

fn join_pieces(pieces: &VecDeque<&str>, separator: &str) -> Option<String> {
    let joined = pieces
        .iter()
        .copied()
        .collect::<Vec<_>>()
        .join(separator);
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn build_chunks(
    document_id: &str,
    source_path: &str,
    page: u32,
    page_text: &str,
    options: &IngestionOptions,
    global_index: u64,
) -> Result<(Vec<TextChunk>, u64), IngestError> {
    let config = ChunkingConfig::from(options);
    let whitespace_re = Regex::new(options.whitespace_regex)?;
    let normalized = collapse_inline_whitespace(page_text, &whitespace_re);

    let mut chunks = Vec::new();
    let mut cursor = global_index;

    for text in split_text(&normalized, &config)? {
        chunks.push(TextChunk {
            chunk_id: make_chunk_id(document_id, page, cursor, &text),
            source_path: source_path.to_string(),
            page,
            chunk_index: cursor,
            text,
        });

        cursor = cursor.saturating_add(1);
    }

    Ok((chunks, cursor))
}

fn make_chunk_id(document_id: &str, page: u32, index: u64, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(document_id.as_bytes());
    hasher.update(page.to_le_bytes());
    hasher.update(index.to_le_bytes());
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}
