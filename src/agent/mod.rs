//! Round orchestration for tool-assisted answers.
//!
//! The agent drives a bounded conversation with the model: it may call the
//! registered tools for up to `max_rounds` rounds, checking after each round
//! whether the model can answer, and forces a final tool-free synthesis once
//! the budget is spent.

mod conversation;
mod runner;

pub use conversation::Conversation;
pub use runner::{Agent, AgentResponse, State, ToolCallRecord, DEFAULT_MAX_ROUNDS};
