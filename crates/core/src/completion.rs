use crate::config::ApiEndpoint;
use crate::error::{CompletionError, ConfigError};
use crate::models::{Message, ModelParameters, Role};
use crate::traits::CompletionClient;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: &'a [Message],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    role: Option<Role>,
    content: Option<String>,
}

/// Client for OpenAI-compatible `/chat/completions` endpoints.
pub struct OpenAiChatClient {
    client: Client,
    endpoint: ApiEndpoint,
}

impl OpenAiChatClient {
    pub fn new(endpoint: ApiEndpoint) -> Result<Self, ConfigError> {
        Ok(Self {
            client: endpoint.http_client()?,
            endpoint,
        })
    }
}

#[async_trait]
impl CompletionClient for OpenAiChatClient {
    async fn complete(
        &self,
        parameters: &ModelParameters,
        messages: &[Message],
    ) -> Result<Message, CompletionError> {
        let request = ChatRequest {
            model: &parameters.model,
            temperature: parameters.temperature,
            messages,
            stream: false,
        };

        debug!(model = %parameters.model, messages = messages.len(), "sending chat completion");

        let response = self
            .client
            .post(self.endpoint.url("chat/completions"))
            .bearer_auth(self.endpoint.credential.expose())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(CompletionError::Status {
                status: status.as_u16(),
                details: api_error_message(&body),
            });
        }

        parse_top_choice(&body)
    }
}

fn api_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

fn parse_top_choice(body: &str) -> Result<Message, CompletionError> {
    let parsed: ChatResponse = serde_json::from_str(body)?;
    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| CompletionError::MalformedResponse("response has no choices".to_string()))?;

    let content = choice.message.content.ok_or_else(|| {
        CompletionError::MalformedResponse("top choice has no message content".to_string())
    })?;

    Ok(Message::new(
        choice.message.role.unwrap_or(Role::Assistant),
        content,
    ))
}
