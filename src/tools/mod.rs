//! Tools the model can call while answering a question.
//!
//! Each tool describes itself with a [`ToolSpec`] and takes its arguments as
//! a JSON object. The [`ToolRegistry`] owns the tools, advertises their
//! schemas and dispatches calls by name.

mod outline;
mod search;
mod sources;

pub use outline::{render_outline, CourseOutlineTool};
pub use search::{format_results, CourseSearchTool, FormattedResults};
pub use sources::SourceTracker;

use crate::error::{KursError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// JSON type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    String,
    Integer,
}

/// One named parameter of a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    pub kind: ParameterKind,
    pub description: String,
    pub required: bool,
}

impl ToolParameter {
    pub fn required(name: &str, kind: ParameterKind, description: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            description: description.to_string(),
            required: true,
        }
    }

    pub fn optional(name: &str, kind: ParameterKind, description: &str) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind, description)
        }
    }
}

/// Description of a tool as advertised to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ToolParameter>,
}

impl ToolSpec {
    /// JSON schema of the tool's arguments object.
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        for param in &self.parameters {
            properties.insert(
                param.name.clone(),
                json!({
                    "type": param.kind,
                    "description": param.description,
                }),
            );
        }

        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// A callable tool.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name, description and parameters of this tool.
    fn spec(&self) -> ToolSpec;

    /// Run the tool with a JSON object of arguments.
    async fn execute(&self, args: Value) -> Result<String>;

    /// Source labels recorded since the last reset.
    fn last_sources(&self) -> Vec<String> {
        Vec::new()
    }

    /// Forget recorded source labels.
    fn reset_sources(&self) {}
}

/// Deserialize tool arguments into a typed struct.
pub(crate) fn parse_args<T: DeserializeOwned>(tool: &str, args: Value) -> Result<T> {
    serde_json::from_value(args)
        .map_err(|e| KursError::ToolExecution(format!("Invalid arguments for '{}': {}", tool, e)))
}

/// Name-keyed collection of tools.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    by_name: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Names must be non-empty and unique.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let name = tool.spec().name;

        if name.trim().is_empty() {
            return Err(KursError::InvalidInput("Tool name must not be empty".to_string()));
        }
        if self.by_name.contains_key(&name) {
            return Err(KursError::InvalidInput(format!(
                "Tool '{}' is already registered",
                name
            )));
        }

        debug!("Registered tool {}", name);
        self.by_name.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Specs of all registered tools, in registration order.
    pub fn schemas(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|t| t.spec()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute a tool by name with raw JSON arguments.
    ///
    /// Unknown names yield the "not found" text rather than an error.
    /// Argument payloads that are not a JSON object, and failures inside the
    /// tool, are returned as `Err` for the caller to contain.
    pub async fn execute(&self, name: &str, arguments: &str) -> Result<String> {
        let Some(tool) = self.by_name.get(name).map(|&i| &self.tools[i]) else {
            return Ok(KursError::ToolNotFound(name.to_string()).to_string());
        };

        let args = parse_arguments(name, arguments)?;
        tool.execute(args).await
    }

    /// Source labels from every tool, deduplicated in first-seen order.
    pub fn last_sources(&self) -> Vec<String> {
        let tracker = SourceTracker::new();
        for tool in &self.tools {
            tracker.extend(tool.last_sources());
        }
        tracker.snapshot()
    }

    /// Clear every tool's recorded sources.
    pub fn reset_sources(&self) {
        for tool in &self.tools {
            tool.reset_sources();
        }
    }
}

fn parse_arguments(tool: &str, arguments: &str) -> Result<Value> {
    // Some models send an empty string for tools called without arguments
    if arguments.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }

    let value: Value = serde_json::from_str(arguments)
        .map_err(|e| KursError::ToolExecution(format!("Invalid arguments for '{}': {}", tool, e)))?;

    if !value.is_object() {
        return Err(KursError::ToolExecution(format!(
            "Invalid arguments for '{}': expected a JSON object",
            tool
        )));
    }

    Ok(value)
}
