//! Metadata filters for content queries.

use super::ChunkMetadata;
use serde_json::json;

/// Predicate over a chunk's course title and lesson number.
///
/// Only the three shapes below exist. "No filter" is expressed as `None`
/// by [`build_filter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrievalFilter {
    /// Exact course title.
    Course(String),
    /// Exact lesson number.
    Lesson(i64),
    /// Both predicates, combined with AND.
    CourseAndLesson {
        course_title: String,
        lesson_number: i64,
    },
}

/// Build a filter from an already resolved course title and lesson number.
pub fn build_filter(course_title: Option<&str>, lesson_number: Option<i64>) -> Option<RetrievalFilter> {
    match (course_title, lesson_number) {
        (None, None) => None,
        (Some(title), None) => Some(RetrievalFilter::Course(title.to_string())),
        (None, Some(lesson)) => Some(RetrievalFilter::Lesson(lesson)),
        (Some(title), Some(lesson)) => Some(RetrievalFilter::CourseAndLesson {
            course_title: title.to_string(),
            lesson_number: lesson,
        }),
    }
}

impl RetrievalFilter {
    /// Course title constrained by this filter, if any.
    pub fn course_title(&self) -> Option<&str> {
        match self {
            RetrievalFilter::Course(title) => Some(title),
            RetrievalFilter::Lesson(_) => None,
            RetrievalFilter::CourseAndLesson { course_title, .. } => Some(course_title),
        }
    }

    /// Lesson number constrained by this filter, if any.
    pub fn lesson_number(&self) -> Option<i64> {
        match self {
            RetrievalFilter::Course(_) => None,
            RetrievalFilter::Lesson(lesson) => Some(*lesson),
            RetrievalFilter::CourseAndLesson { lesson_number, .. } => Some(*lesson_number),
        }
    }

    /// Check whether a chunk satisfies the filter.
    pub fn matches(&self, metadata: &ChunkMetadata) -> bool {
        let course_ok = self
            .course_title()
            .map_or(true, |title| metadata.course_title == title);
        let lesson_ok = self
            .lesson_number()
            .map_or(true, |lesson| metadata.lesson_number == Some(lesson));
        course_ok && lesson_ok
    }

    /// Render as a document-store `where` clause.
    pub fn to_where_clause(&self) -> serde_json::Value {
        match self {
            RetrievalFilter::Course(title) => json!({ "course_title": title }),
            RetrievalFilter::Lesson(lesson) => json!({ "lesson_number": lesson }),
            RetrievalFilter::CourseAndLesson {
                course_title,
                lesson_number,
            } => json!({
                "$and": [
                    { "course_title": course_title },
                    { "lesson_number": lesson_number }
                ]
            }),
        }
    }
}
