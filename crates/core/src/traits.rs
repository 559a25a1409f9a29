use crate::{CompletionError, Message, ModelParameters, RetrievedPassage, SearchError};
use async_trait::async_trait;

#[async_trait]
pub trait Retriever: Send + Sync {
    /// Returns at most `k` passages, most relevant first.
    async fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievedPassage>, SearchError>;
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        parameters: &ModelParameters,
        messages: &[Message],
    ) -> Result<Message, CompletionError>;
}

#[async_trait]
pub trait LineSource: Send {
    /// `Ok(None)` signals end of input.
    async fn next_line(&mut self) -> std::io::Result<Option<String>>;

    fn close(&mut self) {}
}
