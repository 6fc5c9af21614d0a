use std::fmt::Write;

use hera_llm::provider::{Message, Role};
use hera_memory::{ScoredChunk, Turn};

pub const NO_CONTEXT: &str = "No relevant documents found.";

/// Number retrieved chunks as `[i] content` blocks separated by blank lines.
#[must_use]
pub fn format_context(chunks: &[ScoredChunk]) -> String {
    let mut out = String::new();
    for (i, scored) in chunks.iter().enumerate() {
        if i > 0 {
            out.push_str("\n\n");
        }
        let _ = write!(out, "[{}] {}", i + 1, scored.chunk.content);
    }
    out
}

#[must_use]
pub fn build_system_prompt(chunks: &[ScoredChunk]) -> String {
    let context = if chunks.is_empty() {
        NO_CONTEXT.to_owned()
    } else {
        format_context(chunks)
    };

    format!(
        "You are an AI HR assistant for a company. Answer employee questions using the provided context and available tools.\n\
         \n\
         Context from company documents:\n\
         {context}\n\
         \n\
         Guidelines:\n\
         - Use the context above to answer policy and document-related questions.\n\
         - Use the available tools for employee-specific data (vacation balance, salary info, schedule, directory search).\n\
         - If you don't have enough information, say so clearly.\n\
         - Be helpful, professional, and concise."
    )
}

/// System prompt, then prior turns oldest first, then the new question.
pub fn build_messages<'a>(
    system: String,
    history: impl IntoIterator<Item = &'a Turn>,
    question: &str,
) -> Vec<Message> {
    let mut messages = vec![Message::text(Role::System, system)];
    messages.extend(
        history
            .into_iter()
            .map(|turn| Message::text(turn.role, turn.content.clone())),
    );
    messages.push(Message::text(Role::User, question));
    messages
}

#[cfg(test)]
mod tests {
    use hera_memory::document::{Chunk, DocumentFormat, DocumentMetadata};

    use super::*;

    fn scored(content: &str) -> ScoredChunk {
        ScoredChunk {
            chunk: Chunk {
                content: content.into(),
                metadata: DocumentMetadata {
                    source: "policy.md".into(),
                    format: DocumentFormat::Markdown,
                },
                chunk_index: 0,
                overlap: 0,
            },
            score: 0.9,
        }
    }

    #[test]
    fn context_blocks_are_numbered() {
        let ctx = format_context(&[scored("Leave is 25 days."), scored("Pay is monthly.")]);
        assert_eq!(ctx, "[1] Leave is 25 days.\n\n[2] Pay is monthly.");
    }

    #[test]
    fn empty_context_notice() {
        let prompt = build_system_prompt(&[]);
        assert!(prompt.contains("Context from company documents:\nNo relevant documents found.\n"));
        assert!(prompt.starts_with("You are an AI HR assistant"));
    }

    #[test]
    fn system_prompt_embeds_context() {
        let prompt = build_system_prompt(&[scored("Remote work is allowed on Fridays.")]);
        assert!(prompt.contains("[1] Remote work is allowed on Fridays."));
        assert!(!prompt.contains(NO_CONTEXT));
    }

    #[test]
    fn messages_are_ordered() {
        let history = [Turn::user("hi"), Turn::assistant("hello")];
        let messages = build_messages("sys".into(), &history, "how many days?");
        let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::User]
        );
        assert_eq!(messages[3].content, "how many days?");
    }
}
