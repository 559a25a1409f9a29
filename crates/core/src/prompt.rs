//! Builders for the messages sent to the completion API.
//!
//! Everything here is pure: identical inputs always produce identical messages.

use crate::models::{Message, RetrievedPassage};

pub const PERSONA_INSTRUCTIONS: &str = "You are a helpful AI assistant.
Answer the question to the best of your ability.
Feel free to be creative.
Do not preface your answer with things like \"New Idea\" or \"A new idea for simple sabotage could be\".
Do not mention previous answers.";

pub const QUESTION_PREAMBLE: &str = "Answer the user question using the provided context.";

pub const IDEA_TEMPLATE: &str = "Using the provided context, come up with one new idea in the same spirit as the examples.
Keep it short and concrete, and do not repeat an idea you already gave.";

const TRUNCATION_MARKER: char = '…';

/// Seed history for question mode: persona plus the startup question.
pub fn question_seed(question: &str) -> Vec<Message> {
    vec![
        Message::assistant(PERSONA_INSTRUCTIONS),
        Message::user(format!(
            "Answer the user's questions using the provided context.\nQuestion: {question}"
        )),
    ]
}

pub fn idea_seed() -> Vec<Message> {
    vec![Message::system(PERSONA_INSTRUCTIONS)]
}

pub fn format_question_message(question: &str, passages: &[RetrievedPassage]) -> Message {
    Message::user(format!(
        "{QUESTION_PREAMBLE}\nQuestion: {question}\nContext: {}",
        join_passages(passages)
    ))
}

pub fn format_idea_message(passages: &[RetrievedPassage]) -> Message {
    Message::user(format!("{IDEA_TEMPLATE}\nContext: {}", join_passages(passages)))
}

pub fn join_passages(passages: &[RetrievedPassage]) -> String {
    passages
        .iter()
        .map(|passage| passage.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Copy of `message` whose content is cut to at most `limit` characters,
/// the last of which becomes a truncation marker when anything was dropped.
pub fn truncate_for_history(message: &Message, limit: usize) -> Message {
    if message.content.chars().count() <= limit {
        return message.clone();
    }
    if limit == 0 {
        return Message::new(message.role, String::new());
    }

    let mut content = message
        .content
        .chars()
        .take(limit.saturating_sub(1))
        .collect::<String>();
    content.push(TRUNCATION_MARKER);
    Message::new(message.role, content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn passages(texts: &[&str]) -> Vec<RetrievedPassage> {
        texts.iter().map(|text| RetrievedPassage::from_text(*text)).collect()
    }

    #[test]
    fn question_message_carries_question_and_ordered_context() {
        let message = format_question_message(
            "What is sabotage?",
            &passages(&["Simple sabotage requires no tools.", "Workers may slow down."]),
        );

        assert_eq!(message.role, Role::User);
        assert!(message.content.starts_with(QUESTION_PREAMBLE));
        assert!(message.content.contains("Question: What is sabotage?"));
        assert!(message
            .content
            .contains("Context: Simple sabotage requires no tools.\nWorkers may slow down."));
    }

    #[test]
    fn zero_passages_leave_context_block_empty() {
        let message = format_question_message("hi", &[]);
        assert_eq!(message.role, Role::User);
        assert!(message.content.ends_with("Context: "));
        assert!(!message.content.trim().is_empty());

        let idea = format_idea_message(&[]);
        assert!(idea.content.starts_with(IDEA_TEMPLATE));
        assert!(idea.content.ends_with("Context: "));
    }

    #[test]
    fn formatting_is_deterministic() {
        let input = passages(&["a", "b"]);
        assert_eq!(format_idea_message(&input), format_idea_message(&input));
    }

    #[test]
    fn seeds_match_their_mode() {
        let seeded = question_seed("hi");
        assert_eq!(seeded.len(), 2);
        assert_eq!(seeded[0].role, Role::Assistant);
        assert!(seeded[1].content.ends_with("Question: hi"));

        let ideas = idea_seed();
        assert_eq!(ideas.len(), 1);
        assert_eq!(ideas[0].role, Role::System);
    }

    #[test]
    fn truncation_keeps_short_messages_intact() {
        let message = Message::user("short");
        assert_eq!(truncate_for_history(&message, 10), message);
    }

    #[test]
    fn truncation_marks_cut_content() {
        let message = Message::user("abcdefghij");
        let truncated = truncate_for_history(&message, 5);
        assert_eq!(truncated.content, "abcd…");
        assert_eq!(truncated.content.chars().count(), 5);
        assert_eq!(truncated.role, Role::User);
    }

    #[test]
    fn zero_limit_keeps_nothing() {
        let truncated = truncate_for_history(&Message::user("abc"), 0);
        assert!(truncated.content.is_empty());
        assert_eq!(truncated.role, Role::User);
    }
}
