use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single chat message as exchanged with the completion API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentFingerprint {
    pub document_id: String,
    pub source_path: String,
    pub checksum: String,
    pub page_count: usize,
    pub ingested_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextChunk {
    pub chunk_id: String,
    pub source_path: String,
    pub page: u32,
    pub chunk_index: u64,
    pub text: String,
}

/// A chunk returned by similarity search for one turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievedPassage {
    pub chunk_id: String,
    pub page: u32,
    pub score: f32,
    pub text: String,
}

impl RetrievedPassage {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            chunk_id: String::new(),
            page: 0,
            score: 0.0,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelParameters {
    pub model: String,
    pub temperature: f32,
}

impl Default for ModelParameters {
    fn default() -> Self {
        Self {
            model: "gpt-4".to_string(),
            temperature: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IngestionOptions {
    pub separator: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub whitespace_regex: &'static str,
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            separator: ". ".to_string(),
            chunk_size: 2_500,
            chunk_overlap: 200,
            whitespace_regex: r"[ \t\u{a0}]+",
        }
    }
}
