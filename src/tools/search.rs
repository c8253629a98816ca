//! Content search tool.

use super::{parse_args, ParameterKind, SourceTracker, Tool, ToolParameter, ToolSpec};
use crate::error::Result;
use crate::retrieval::Retriever;
use crate::vector_store::{ChunkMetadata, SearchResults};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

pub const SEARCH_TOOL_NAME: &str = "search_course_content";

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
    #[serde(default)]
    course_name: Option<String>,
    #[serde(default)]
    lesson_number: Option<i64>,
}

/// Display text and source labels for one search. Labels are unique, in
/// order of first appearance.
#[derive(Debug, Clone, PartialEq)]
pub struct FormattedResults {
    pub text: String,
    pub sources: Vec<String>,
}

fn label(metadata: &ChunkMetadata) -> String {
    match metadata.lesson_number {
        Some(n) => format!("{} - Lesson {}", metadata.course_title, n),
        None => metadata.course_title.clone(),
    }
}

/// Render a result set for the model.
///
/// `course_name` and `lesson_number` are the filters as requested, and only
/// show up in the "nothing found" message.
pub fn format_results(
    results: &SearchResults,
    course_name: Option<&str>,
    lesson_number: Option<i64>,
) -> FormattedResults {
    if let Some(error) = &results.error {
        return FormattedResults {
            text: error.clone(),
            sources: Vec::new(),
        };
    }

    if results.is_empty() {
        let mut text = "No relevant content found".to_string();
        if let Some(course) = course_name {
            text.push_str(&format!(" in course '{}'", course));
        }
        if let Some(lesson) = lesson_number {
            text.push_str(&format!(" in lesson {}", lesson));
        }
        return FormattedResults {
            text,
            sources: Vec::new(),
        };
    }

    let mut blocks = Vec::with_capacity(results.len());
    let mut sources = Vec::with_capacity(results.len());

    for (document, metadata) in results.documents.iter().zip(&results.metadata) {
        let label = label(metadata);
        blocks.push(format!("[{}]\n{}", label, document));
        if !sources.contains(&label) {
            sources.push(label);
        }
    }

    FormattedResults {
        text: blocks.join("\n\n"),
        sources,
    }
}

/// Semantic search over lesson content with optional course and lesson filters.
pub struct CourseSearchTool {
    retriever: Arc<Retriever>,
    sources: SourceTracker,
}

impl CourseSearchTool {
    pub fn new(retriever: Arc<Retriever>) -> Self {
        Self {
            retriever,
            sources: SourceTracker::new(),
        }
    }
}

#[async_trait]
impl Tool for CourseSearchTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: SEARCH_TOOL_NAME.to_string(),
            description: "Search course materials with smart course name matching and lesson filtering"
                .to_string(),
            parameters: vec![
                ToolParameter::required(
                    "query",
                    ParameterKind::String,
                    "What to search for in the course content",
                ),
                ToolParameter::optional(
                    "course_name",
                    ParameterKind::String,
                    "Course title (partial matches work, e.g. 'MCP', 'Introduction')",
                ),
                ToolParameter::optional(
                    "lesson_number",
                    ParameterKind::Integer,
                    "Specific lesson number to search within (e.g. 1, 2, 3)",
                ),
            ],
        }
    }

    async fn execute(&self, args: Value) -> Result<String> {
        let args: SearchArgs = parse_args(SEARCH_TOOL_NAME, args)?;

        let results = self
            .retriever
            .search(&args.query, args.course_name.as_deref(), args.lesson_number)
            .await;

        let formatted = format_results(&results, args.course_name.as_deref(), args.lesson_number);
        debug!("Search returned {} sources", formatted.sources.len());
        self.sources.extend(formatted.sources);

        Ok(formatted.text)
    }

    fn last_sources(&self) -> Vec<String> {
        self.sources.snapshot()
    }

    fn reset_sources(&self) {
        self.sources.reset();
    }
}
