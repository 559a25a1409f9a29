use anyhow::Context;
use chrono::Utc;
use clap::{Parser, ValueEnum};
use pdf_chat_core::config::{
    DEFAULT_EMBEDDING_MODEL, DEFAULT_HISTORY_CHAR_LIMIT, DEFAULT_PDF_PATH, DEFAULT_TOP_K,
};
use pdf_chat_core::{
    load_document_chunks, ApiCredential, ApiEndpoint, CharacterNgramEmbedder, ChatSession,
    ChatSettings, ChatVariant, Conversation, Embedder, IngestionOptions, MemoryVectorStore,
    ModelParameters, OpenAiChatClient, OpenAiEmbedder, StdinLines, DEFAULT_API_BASE_URL,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "pdf-chat", version, about = "Chat with an LLM about the contents of a PDF")]
struct Cli {
    /// Question fixed for the whole session; also the retrieval query in question mode.
    #[arg(default_value = "hi")]
    question: String,

    /// Conversation style.
    #[arg(long, value_enum, default_value_t = Mode::Question)]
    mode: Mode,

    /// PDF file to load.
    #[arg(long, default_value = DEFAULT_PDF_PATH)]
    pdf: PathBuf,

    /// API key for the chat and embedding endpoints.
    #[arg(long, env = "OPEN_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Base URL of the OpenAI-compatible API.
    #[arg(long, default_value = DEFAULT_API_BASE_URL)]
    api_base_url: String,

    /// Chat model identifier.
    #[arg(long, default_value = "gpt-4")]
    model: String,

    /// Sampling temperature.
    #[arg(long, default_value_t = 0.0)]
    temperature: f32,

    /// Passages retrieved per turn.
    #[arg(long, default_value_t = DEFAULT_TOP_K)]
    top_k: usize,

    /// Maximum chunk length in characters.
    #[arg(long, default_value_t = 2_500)]
    chunk_size: usize,

    /// Characters shared between neighbouring chunks.
    #[arg(long, default_value_t = 200)]
    chunk_overlap: usize,

    /// Separator the splitter breaks page text on.
    #[arg(long, default_value = ". ")]
    separator: String,

    /// Remote embedding model.
    #[arg(long, default_value = DEFAULT_EMBEDDING_MODEL)]
    embedding_model: String,

    /// Embed locally with character trigrams instead of calling the API.
    #[arg(long, default_value_t = false)]
    local_embeddings: bool,

    /// Characters of each ideas-mode prompt kept in history.
    #[arg(long, default_value_t = DEFAULT_HISTORY_CHAR_LIMIT)]
    history_char_limit: usize,

    /// Per-request timeout; unset waits indefinitely.
    #[arg(long)]
    request_timeout_secs: Option<u64>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    /// Answer questions using retrieved passages.
    Question,
    /// Generate new ideas from retrieved passages.
    Ideas,
}

impl Cli {
    fn settings(&self) -> ChatSettings {
        ChatSettings {
            pdf_path: self.pdf.clone(),
            parameters: ModelParameters {
                model: self.model.clone(),
                temperature: self.temperature,
            },
            embedding_model: self.embedding_model.clone(),
            top_k: self.top_k,
            ingestion: IngestionOptions {
                separator: self.separator.clone(),
                chunk_size: self.chunk_size,
                chunk_overlap: self.chunk_overlap,
                ..IngestionOptions::default()
            },
            history_char_limit: self.history_char_limit,
        }
    }

    fn variant(&self, settings: &ChatSettings) -> ChatVariant {
        match self.mode {
            Mode::Question => ChatVariant::Question {
                question: self.question.clone(),
            },
            Mode::Ideas => ChatVariant::Ideas {
                history_char_limit: settings.history_char_limit,
            },
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        mode = ?cli.mode,
        "pdf-chat boot"
    );

    let settings = cli.settings();
    settings.validate()?;

    let credential = ApiCredential::new(cli.api_key.clone())?;
    let endpoint = ApiEndpoint::new(
        &cli.api_base_url,
        credential,
        cli.request_timeout_secs.map(Duration::from_secs),
    )?;

    if matches!(cli.mode, Mode::Ideas) && cli.question != "hi" {
        warn!(question = %cli.question, "ideas mode ignores the question argument");
    }

    let document = load_document_chunks(&settings.pdf_path, &settings.ingestion)
        .with_context(|| format!("unable to load {}", settings.pdf_path.display()))?;
    info!(
        document_id = %document.fingerprint.document_id,
        checksum = %document.fingerprint.checksum,
        chunk_count = document.chunks.len(),
        "document loaded"
    );

    let embedder: Box<dyn Embedder> = if cli.local_embeddings {
        Box::new(CharacterNgramEmbedder::default())
    } else {
        Box::new(OpenAiEmbedder::new(endpoint.clone(), &settings.embedding_model)?)
    };
    let store = MemoryVectorStore::from_chunks(document.chunks, embedder)
        .await
        .context("unable to embed document chunks")?;

    let client = OpenAiChatClient::new(endpoint)?;
    let variant = cli.variant(&settings);
    let conversation = Conversation::new(
        &store,
        &client,
        settings.parameters.clone(),
        variant.clone(),
        settings.top_k,
    );
    let mut session = ChatSession::for_variant(&variant);

    println!("Chatbot initialized. Type \"exit\" to end the chat.");

    let mut input = StdinLines::new();
    let mut stdout = std::io::stdout();
    let summary = conversation.run(&mut session, &mut input, &mut stdout).await?;

    info!(
        session_id = %session.id(),
        started_at = %session.started_at().to_rfc3339(),
        answered = summary.answered_turns,
        failed = summary.failed_turns,
        "goodbye"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Cli, Mode};
    use clap::Parser;
    use pdf_chat_core::ChatVariant;

    #[test]
    fn defaults_mirror_the_original_script() {
        let cli = Cli::try_parse_from(["pdf-chat"]).unwrap();
        let settings = cli.settings();

        assert_eq!(cli.question, "hi");
        assert!(matches!(cli.mode, Mode::Question));
        assert_eq!(settings.pdf_path.to_str(), Some("simple-sab.pdf"));
        assert_eq!(settings.parameters.model, "gpt-4");
        assert_eq!(settings.parameters.temperature, 0.0);
        assert_eq!(settings.top_k, 2);
        assert_eq!(settings.ingestion.separator, ". ");
        assert_eq!(settings.ingestion.chunk_size, 2_500);
        assert_eq!(settings.ingestion.chunk_overlap, 200);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn positional_question_feeds_question_mode() {
        let cli = Cli::try_parse_from(["pdf-chat", "What is sabotage?"]).unwrap();
        let settings = cli.settings();
        assert_eq!(
            cli.variant(&settings),
            ChatVariant::Question {
                question: "What is sabotage?".to_string()
            }
        );
    }

    #[test]
    fn ideas_mode_uses_history_limit() {
        let cli = Cli::try_parse_from(["pdf-chat", "--mode", "ideas", "--history-char-limit", "64"])
            .unwrap();
        let settings = cli.settings();
        assert_eq!(
            cli.variant(&settings),
            ChatVariant::Ideas {
                history_char_limit: 64
            }
        );
    }

    #[test]
    fn zero_history_limit_fails_validation() {
        let cli = Cli::try_parse_from(["pdf-chat", "--mode", "ideas", "--history-char-limit", "0"])
            .unwrap();
        assert!(cli.settings().validate().is_err());
    }
}
