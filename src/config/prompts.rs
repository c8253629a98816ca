//! Prompt templates for Kurs.
//!
//! Prompts can be customized by placing an `agent.toml` file in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub agent: AgentPrompts,
}

/// Prompts driving the tool-calling answer loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentPrompts {
    /// System instructions sent with every model call.
    pub system: String,
    /// Asked after a round of tool results when more rounds remain.
    pub continuation: String,
    /// Asked once the round budget is spent.
    pub final_synthesis: String,
    /// Wraps the user's question. `{{query}}` is replaced.
    pub query: String,
}

impl Default for AgentPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are an AI assistant specialized in course materials and educational content with access to search and outline tools for course information.

Tool Usage Guidelines:
- Use **search_course_content** for questions about specific course content, lessons, or detailed educational materials
- Use **get_course_outline** for questions about course structure, lesson lists, course links, or when users ask for an "outline" or "overview" of a course
- Up to {{max_rounds}} rounds of tool calls are available to gather information
- After each round, assess whether you have enough information; use a further round only to clarify or expand
- Synthesize tool results into accurate, fact-based responses
- If a tool yields no results, state this clearly without offering alternatives

Response Protocol:
- General knowledge questions: answer using existing knowledge without tools
- Course-specific questions: use the appropriate tools first, then answer
- Course outline questions: provide the course title, course link, and the complete lesson list
- No meta-commentary: do not explain your reasoning or mention the tools or search results

All responses must be brief, educational, clear, and supported by examples when they aid understanding.
Provide only the direct answer to what was asked."#
                .to_string(),

            continuation: "Based on the information you've gathered, do you have sufficient information to provide a complete answer, or do you need to use additional tools? If you need more information, use the appropriate tools. If you have sufficient information, provide your final comprehensive response."
                .to_string(),

            final_synthesis:
                "Based on all the information gathered, please provide your final comprehensive answer."
                    .to_string(),

            query: "Answer this question about course materials: {{query}}".to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts, overriding defaults from a custom directory when given.
    pub fn load(custom_dir: Option<&str>) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let agent_path = custom_path.join("agent.toml");
            if agent_path.exists() {
                let content = std::fs::read_to_string(&agent_path)?;
                prompts.agent = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.agent.system.contains("search_course_content"));
        assert!(prompts.agent.system.contains("get_course_outline"));
        assert!(prompts.agent.query.contains("{{query}}"));
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = std::collections::HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_custom_dir_overrides_agent_prompts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("agent.toml"),
            "system = \"Custom system\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str()).unwrap();
        assert_eq!(prompts.agent.system, "Custom system");
        // Unspecified fields keep their defaults
        assert!(prompts.agent.final_synthesis.contains("final comprehensive answer"));
    }
}
