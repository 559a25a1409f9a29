use crate::config::DEFAULT_HISTORY_CHAR_LIMIT;
use crate::models::{Message, ModelParameters, RetrievedPassage};
use crate::prompt::{
    format_idea_message, format_question_message, idea_seed, question_seed, truncate_for_history,
    IDEA_TEMPLATE,
};
use crate::traits::{CompletionClient, LineSource, Retriever};
use crate::ChatError;
use chrono::{DateTime, Utc};
use std::io::Write;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

pub const PROMPT: &str = "\nYou: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingInput,
    Terminated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatVariant {
    /// Answers free-form questions about the document.
    Question { question: String },
    /// Produces new ideas from the document; no question parameter.
    Ideas { history_char_limit: usize },
}

impl Default for ChatVariant {
    fn default() -> Self {
        Self::Question {
            question: "hi".to_string(),
        }
    }
}

impl ChatVariant {
    pub fn ideas() -> Self {
        Self::Ideas {
            history_char_limit: DEFAULT_HISTORY_CHAR_LIMIT,
        }
    }

    pub fn seed_history(&self) -> Vec<Message> {
        match self {
            Self::Question { question } => question_seed(question),
            Self::Ideas { .. } => idea_seed(),
        }
    }

    /// Text used for similarity search on a turn.
    ///
    /// Question mode always searches with the question given at startup, not
    /// with what the user typed, which keeps the retrieved context pinned to
    /// one topic. It is unclear whether the upstream behaviour was meant as a
    /// fixed-topic bot; it is kept unchanged here.
    ///
    /// Ideas mode searches with the input, falling back to the idea template
    /// for a blank line since embedding APIs reject empty input.
    pub fn search_query<'a>(&'a self, input: &'a str) -> &'a str {
        match self {
            Self::Question { question } => question.as_str(),
            Self::Ideas { .. } if input.trim().is_empty() => IDEA_TEMPLATE,
            Self::Ideas { .. } => input,
        }
    }

    pub fn format_message(&self, input: &str, passages: &[RetrievedPassage]) -> Message {
        match self {
            Self::Question { .. } => format_question_message(input, passages),
            Self::Ideas { .. } => format_idea_message(passages),
        }
    }

    /// What of the outgoing user message is kept in history.
    pub fn project_for_history(&self, message: &Message) -> Message {
        match self {
            Self::Question { .. } => message.clone(),
            Self::Ideas { history_char_limit } => truncate_for_history(message, *history_char_limit),
        }
    }
}

/// History and state of one chat, owned by the caller and lent to the loop.
#[derive(Debug, Clone)]
pub struct ChatSession {
    id: Uuid,
    started_at: DateTime<Utc>,
    history: Vec<Message>,
    state: SessionState,
}

impl ChatSession {
    pub fn new(seed: Vec<Message>) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            history: seed,
            state: SessionState::AwaitingInput,
        }
    }

    pub fn for_variant(variant: &ChatVariant) -> Self {
        Self::new(variant.seed_history())
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_terminated(&self) -> bool {
        self.state == SessionState::Terminated
    }

    fn record_turn(&mut self, user: Message, response: Message) {
        self.history.push(user);
        self.history.push(response);
    }

    fn terminate(&mut self) {
        self.state = SessionState::Terminated;
    }
}

pub fn is_exit_command(input: &str) -> bool {
    let lowered = input.to_lowercase();
    lowered == "exit" || lowered == "exit;"
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Exited,
    Answered(Message),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub answered_turns: usize,
    pub failed_turns: usize,
}

pub struct Conversation<'a, R: ?Sized, C: ?Sized> {
    retriever: &'a R,
    client: &'a C,
    parameters: ModelParameters,
    variant: ChatVariant,
    top_k: usize,
}

impl<'a, R, C> Conversation<'a, R, C>
where
    R: Retriever + ?Sized,
    C: CompletionClient + ?Sized,
{
    pub fn new(
        retriever: &'a R,
        client: &'a C,
        parameters: ModelParameters,
        variant: ChatVariant,
        top_k: usize,
    ) -> Self {
        Self {
            retriever,
            client,
            parameters,
            variant,
            top_k,
        }
    }

    /// Handles one line of input. On error the session is left untouched.
    pub async fn take_turn(
        &self,
        session: &mut ChatSession,
        input: &str,
    ) -> Result<TurnOutcome, ChatError> {
        if session.is_terminated() {
            return Ok(TurnOutcome::Exited);
        }

        if is_exit_command(input) {
            session.terminate();
            return Ok(TurnOutcome::Exited);
        }

        let query = self.variant.search_query(input);
        let passages = self.retriever.search(query, self.top_k).await?;
        debug!(query, passages = passages.len(), "retrieved context");

        let message = self.variant.format_message(input, &passages);
        let mut outgoing = Vec::with_capacity(session.history().len() + 1);
        outgoing.extend_from_slice(session.history());
        outgoing.push(message.clone());

        let response = self.client.complete(&self.parameters, &outgoing).await?;
        session.record_turn(self.variant.project_for_history(&message), response.clone());

        Ok(TurnOutcome::Answered(response))
    }

    /// Reads lines until the exit command or end of input, printing each
    /// response. A failed turn is reported on `output` and the loop goes on.
    pub async fn run<L, W>(
        &self,
        session: &mut ChatSession,
        input: &mut L,
        output: &mut W,
    ) -> Result<SessionSummary, ChatError>
    where
        L: LineSource + ?Sized,
        W: Write,
    {
        let span = info_span!("chat_session", session_id = %session.id());

        async move {
            let mut summary = SessionSummary::default();

            loop {
                write!(output, "{PROMPT}")?;
                output.flush()?;

                let Some(line) = input.next_line().await? else {
                    debug!("input closed");
                    session.terminate();
                    break;
                };

                match self.take_turn(session, &line).await {
                    Ok(TurnOutcome::Exited) => {
                        input.close();
                        break;
                    }
                    Ok(TurnOutcome::Answered(response)) => {
                        summary.answered_turns += 1;
                        writeln!(output, "\n{}", response.content)?;
                    }
                    Err(error) => {
                        summary.failed_turns += 1;
                        warn!(%error, "turn failed");
                        writeln!(
                            output,
                            "\nSorry, that request failed ({error}). Try again or type \"exit\" to quit."
                        )?;
                    }
                }
            }

            info!(
                answered = summary.answered_turns,
                failed = summary.failed_turns,
                history = session.history().len(),
                "chat session ended"
            );
            Ok(summary)
        }
        .instrument(span)
        .await
    }
}
