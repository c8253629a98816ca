//! Course outline tool.

use super::{parse_args, ParameterKind, Tool, ToolParameter, ToolSpec};
use crate::error::{KursError, Result};
use crate::retrieval::Retriever;
use crate::vector_store::Course;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

pub const OUTLINE_TOOL_NAME: &str = "get_course_outline";

#[derive(Debug, Deserialize)]
struct OutlineArgs {
    course_name: String,
}

/// Render a course with its full lesson list.
pub fn render_outline(course: &Course) -> String {
    let mut lines = vec![format!("Course Title: {}", course.title)];

    if let Some(link) = &course.course_link {
        lines.push(format!("Course Link: {}", link));
    }
    if let Some(instructor) = &course.instructor {
        lines.push(format!("Course Instructor: {}", instructor));
    }

    if course.lessons.is_empty() {
        lines.push("No lessons available".to_string());
    } else {
        lines.push(format!("Lessons ({} total):", course.lessons.len()));
        for lesson in &course.lessons {
            lines.push(format!("Lesson {}: {}", lesson.lesson_number, lesson.title));
        }
    }

    lines.join("\n")
}

/// Looks up a course's title, link and lesson list.
pub struct CourseOutlineTool {
    retriever: Arc<Retriever>,
}

impl CourseOutlineTool {
    pub fn new(retriever: Arc<Retriever>) -> Self {
        Self { retriever }
    }
}

#[async_trait]
impl Tool for CourseOutlineTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: OUTLINE_TOOL_NAME.to_string(),
            description: "Get the complete outline of a course: title, link and all lessons".to_string(),
            parameters: vec![ToolParameter::required(
                "course_name",
                ParameterKind::String,
                "Course title (partial matches work, e.g. 'MCP', 'Introduction')",
            )],
        }
    }

    async fn execute(&self, args: Value) -> Result<String> {
        let args: OutlineArgs = parse_args(OUTLINE_TOOL_NAME, args)?;

        match self.retriever.course_outline(&args.course_name).await {
            Ok(course) => Ok(render_outline(&course)),
            Err(KursError::Retrieval(message)) => Ok(message),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, KeywordEmbedder};
    use crate::vector_store::MemoryVectorStore;
    use serde_json::json;

    #[tokio::test]
    async fn test_outline_for_fuzzy_name() {
        let store = testing::seeded_store().await;
        let tool = CourseOutlineTool::new(Arc::new(Retriever::new(
            store,
            Arc::new(KeywordEmbedder::new()),
            5,
        )));

        let output = tool.execute(json!({ "course_name": "python" })).await.unwrap();
        assert_eq!(
            output,
            "Course Title: Python Basics\n\
             Course Link: https://example.com/python\n\
             Course Instructor: Ada Lovelace\n\
             Lessons (2 total):\n\
             Lesson 1: Getting Started\n\
             Lesson 2: Variables"
        );
        assert!(tool.last_sources().is_empty());
    }

    #[tokio::test]
    async fn test_outline_unknown_course() {
        let tool = CourseOutlineTool::new(Arc::new(Retriever::new(
            Arc::new(MemoryVectorStore::new()),
            Arc::new(KeywordEmbedder::new()),
            5,
        )));

        let output = tool.execute(json!({ "course_name": "MCP" })).await.unwrap();
        assert_eq!(output, "No course found matching 'MCP'");
    }

    #[test]
    fn test_outline_without_lessons() {
        let rendered = render_outline(&Course::new("Empty"));
        assert_eq!(rendered, "Course Title: Empty\nNo lessons available");
    }
}
