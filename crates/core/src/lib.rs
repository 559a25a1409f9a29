pub mod chunking;
pub mod completion;
pub mod config;
pub mod console;
pub mod conversation;
pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod ingest;
pub mod models;
pub mod prompt;
pub mod store;
pub mod traits;

pub use chunking::{build_chunks, collapse_inline_whitespace, split_text, ChunkingConfig};
pub use completion::OpenAiChatClient;
pub use config::{ApiCredential, ApiEndpoint, ChatSettings, API_KEY_ENV, DEFAULT_API_BASE_URL};
pub use console::{ScriptedLines, StdinLines};
pub use conversation::{
    is_exit_command, ChatSession, ChatVariant, Conversation, SessionState, SessionSummary,
    TurnOutcome,
};
pub use embeddings::{CharacterNgramEmbedder, Embedder, OpenAiEmbedder, DEFAULT_EMBEDDING_DIMENSIONS};
pub use error::{ChatError, CompletionError, ConfigError, IngestError, SearchError};
pub use extractor::{extract_page_texts, LopdfExtractor, PageText, PdfExtractor};
pub use ingest::{digest_file, load_document_chunks, load_document_chunks_with, LoadedDocument};
pub use models::{
    DocumentFingerprint, IngestionOptions, Message, ModelParameters, RetrievedPassage, Role,
    TextChunk,
};
pub use prompt::{format_idea_message, format_question_message};
pub use store::MemoryVectorStore;
pub use traits::{CompletionClient, LineSource, Retriever};
