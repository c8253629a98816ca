//! Message history accumulated while answering one query.

use crate::llm::{ChatMessage, ChatRequest, ModelTurn};
use crate::tools::ToolSpec;

/// The running exchange with the model for a single query.
///
/// Starts as system instructions plus the user's question; tool requests,
/// tool results and follow-up prompts are appended as the rounds progress.
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    /// Start a conversation. A non-empty `context` is appended to the system
    /// instructions as the previous conversation.
    pub fn new(system: &str, context: Option<&str>, query: &str) -> Self {
        let system = match context.map(str::trim) {
            Some(ctx) if !ctx.is_empty() => format!("{}\n\nPrevious conversation:\n{}", system, ctx),
            _ => system.to_string(),
        };

        Self {
            messages: vec![ChatMessage::System(system), ChatMessage::User(query.to_string())],
        }
    }

    pub fn push_user(&mut self, content: &str) {
        self.messages.push(ChatMessage::User(content.to_string()));
    }

    /// Record the model's tool-requesting turn.
    pub fn push_assistant(&mut self, turn: &ModelTurn) {
        self.messages.push(ChatMessage::Assistant {
            content: turn.content.clone(),
            tool_calls: turn.tool_calls.clone(),
        });
    }

    pub fn push_tool_result(&mut self, tool_call_id: &str, content: &str) {
        self.messages.push(ChatMessage::Tool {
            tool_call_id: tool_call_id.to_string(),
            content: content.to_string(),
        });
    }

    /// Build a model request over the whole history.
    pub fn request(&self, tools: Vec<ToolSpec>) -> ChatRequest {
        ChatRequest {
            messages: self.messages.clone(),
            tools,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }
}
