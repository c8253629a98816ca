//! Bounded multi-round tool calling loop.

use super::conversation::Conversation;
use crate::config::{AgentPrompts, Prompts};
use crate::error::Result;
use crate::llm::{ChatModel, ModelTurn, ToolCallRequest};
use crate::tools::ToolRegistry;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Default number of tool-executing rounds per query.
pub const DEFAULT_MAX_ROUNDS: usize = 2;

/// Position of one query in the round loop.
#[derive(Debug, Clone, PartialEq)]
pub enum State {
    /// Ask the model for an answer or a first batch of tool calls.
    RoundStart(usize),
    /// Run a batch of tool calls belonging to `round`.
    ExecutingTools {
        round: usize,
        calls: Vec<ToolCallRequest>,
    },
    /// Ask the model whether round `n`'s results suffice.
    ContinuationCheck(usize),
    /// Round budget spent; ask for an answer without tools.
    FinalSynthesis,
    Done(String),
}

/// Agent answering questions with the registered tools.
pub struct Agent {
    model: Arc<dyn ChatModel>,
    tools: Arc<ToolRegistry>,
    prompts: AgentPrompts,
    max_rounds: usize,
}

/// Mutable state of one run.
struct Run {
    conversation: Conversation,
    tool_calls: Vec<ToolCallRecord>,
    rounds: usize,
    model_calls: usize,
}

impl Agent {
    /// Create a new agent over a tool registry.
    pub fn new(model: Arc<dyn ChatModel>, tools: Arc<ToolRegistry>, prompts: AgentPrompts) -> Self {
        Self {
            model,
            tools,
            prompts,
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }

    /// Set the maximum number of tool-executing rounds (at least 1).
    pub fn with_max_rounds(mut self, max: usize) -> Self {
        self.max_rounds = max.max(1);
        self
    }

    pub fn max_rounds(&self) -> usize {
        self.max_rounds
    }

    fn system_prompt(&self) -> String {
        let mut vars = HashMap::new();
        vars.insert("max_rounds".to_string(), self.max_rounds.to_string());
        Prompts::render(&self.prompts.system, &vars)
    }

    /// Answer `query`, with `context` summarizing earlier turns.
    ///
    /// Tool failures are fed back to the model as text. Model transport
    /// failures abort the run.
    #[instrument(skip(self, query, context), fields(max_rounds = self.max_rounds))]
    pub async fn run(&self, query: &str, context: Option<&str>) -> Result<AgentResponse> {
        let mut run = Run {
            conversation: Conversation::new(&self.system_prompt(), context, query),
            tool_calls: Vec::new(),
            rounds: 0,
            model_calls: 0,
        };

        let mut state = State::RoundStart(1);
        loop {
            state = self.step(state, &mut run).await?;
            debug!(?state, "Agent transition");

            if let State::Done(answer) = state {
                info!(
                    rounds = run.rounds,
                    model_calls = run.model_calls,
                    tool_calls = run.tool_calls.len(),
                    "Agent finished"
                );
                return Ok(AgentResponse {
                    answer,
                    tool_calls: run.tool_calls,
                    rounds: run.rounds,
                    model_calls: run.model_calls,
                });
            }
        }
    }

    /// Advance one state.
    async fn step(&self, state: State, run: &mut Run) -> Result<State> {
        match state {
            State::RoundStart(round) => {
                let turn = self.call_model(run, true).await?;
                Ok(Self::after_decision(run, round, turn))
            }

            State::ExecutingTools { round, calls } => {
                for call in &calls {
                    let record = self.execute_tool_call(call).await;
                    run.conversation.push_tool_result(&record.id, &record.result);
                    run.tool_calls.push(record);
                }
                run.rounds = round;

                if round >= self.max_rounds {
                    Ok(State::FinalSynthesis)
                } else {
                    Ok(State::ContinuationCheck(round))
                }
            }

            State::ContinuationCheck(round) => {
                run.conversation.push_user(&self.prompts.continuation);
                let turn = self.call_model(run, true).await?;
                // Tools requested here open the next round directly
                Ok(Self::after_decision(run, round + 1, turn))
            }

            State::FinalSynthesis => {
                run.conversation.push_user(&self.prompts.final_synthesis);
                let turn = self.call_model(run, false).await?;
                Ok(State::Done(turn.into_text()))
            }

            State::Done(answer) => Ok(State::Done(answer)),
        }
    }

    /// Either finish with the turn's text or schedule its tool calls.
    fn after_decision(run: &mut Run, round: usize, turn: ModelTurn) -> State {
        if !turn.wants_tools() {
            return State::Done(turn.into_text());
        }

        run.conversation.push_assistant(&turn);
        State::ExecutingTools {
            round,
            calls: turn.tool_calls,
        }
    }

    async fn call_model(&self, run: &mut Run, with_tools: bool) -> Result<ModelTurn> {
        let tools = if with_tools {
            self.tools.schemas()
        } else {
            Vec::new()
        };

        run.model_calls += 1;
        self.model.complete(run.conversation.request(tools)).await
    }

    /// Execute a single tool call and return a record of it.
    async fn execute_tool_call(&self, call: &ToolCallRequest) -> ToolCallRecord {
        info!("Agent calling tool: {} with args: {}", call.name, call.arguments);

        let result = match self.tools.execute(&call.name, &call.arguments).await {
            Ok(output) => output,
            Err(e) => {
                warn!("Tool {} failed: {}", call.name, e);
                format!("Tool execution failed: {}", e)
            }
        };

        ToolCallRecord {
            id: call.id.clone(),
            name: call.name.clone(),
            arguments: call.arguments.clone(),
            result,
        }
    }
}

/// Response from an agent run.
#[derive(Debug)]
pub struct AgentResponse {
    /// The final answer text.
    pub answer: String,
    /// Record of all tool calls made during execution.
    pub tool_calls: Vec<ToolCallRecord>,
    /// Number of rounds that executed tools.
    pub rounds: usize,
    /// Number of model calls made.
    pub model_calls: usize,
}

/// Record of a tool call made by the agent.
#[derive(Debug, Clone)]
pub struct ToolCallRecord {
    pub id: String,
    /// Name of the tool called.
    pub name: String,
    /// JSON arguments passed to the tool.
    pub arguments: String,
    /// Result returned by the tool.
    pub result: String,
}

impl std::fmt::Display for ToolCallRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.arguments)
    }
}
