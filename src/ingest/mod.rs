//! Course document ingestion.
//!
//! A course document is plain text with a small header followed by lesson
//! sections:
//!
//! ```text
//! Course Title: Python Basics
//! Course Link: https://example.com/python
//! Course Instructor: Ada Lovelace
//!
//! Lesson 1: Getting Started
//! Lesson Link: https://example.com/python/1
//! Lesson text...
//! ```

mod chunker;

pub use chunker::SentenceChunker;

use crate::config::RetrievalSettings;
use crate::error::{KursError, Result};
use crate::vector_store::{Course, CourseChunk, Lesson};
use regex::Regex;
use std::path::Path;
use tracing::debug;

/// File extensions picked up when loading a folder.
pub const DOCUMENT_EXTENSIONS: &[&str] = &["txt", "md"];

/// A parsed course ready for indexing.
#[derive(Debug, Clone)]
pub struct CourseDocument {
    pub course: Course,
    pub chunks: Vec<CourseChunk>,
}

/// Parses course documents into catalog entries and content chunks.
pub struct DocumentProcessor {
    chunker: SentenceChunker,
    header_field: Regex,
    lesson_header: Regex,
    lesson_link: Regex,
}

impl DocumentProcessor {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| KursError::Ingest(format!("Invalid pattern: {}", e)))
        };

        Ok(Self {
            chunker: SentenceChunker::new(chunk_size, chunk_overlap)?,
            header_field: compile(r"(?i)^course\s+(title|link|instructor)\s*:\s*(.*)$")?,
            lesson_header: compile(r"(?i)^lesson\s+(\d+)\s*:\s*(.*)$")?,
            lesson_link: compile(r"(?i)^lesson\s+link\s*:\s*(.*)$")?,
        })
    }

    pub fn from_settings(settings: &RetrievalSettings) -> Result<Self> {
        Self::new(settings.chunk_size, settings.chunk_overlap)
    }

    /// Read and parse a course file. The file stem is the fallback title.
    pub async fn process_file(&self, path: &Path) -> Result<CourseDocument> {
        let text = tokio::fs::read_to_string(path).await?;
        let fallback = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        self.parse(&text, &fallback)
    }

    /// Parse document text.
    pub fn parse(&self, text: &str, fallback_title: &str) -> Result<CourseDocument> {
        let mut course = Course::new(fallback_title.trim());
        let mut preamble: Vec<&str> = Vec::new();
        let mut sections: Vec<(Lesson, Vec<&str>)> = Vec::new();

        for line in text.lines() {
            let trimmed = line.trim();

            if let Some(caps) = self.lesson_header.captures(trimmed) {
                let number = caps[1]
                    .parse::<i64>()
                    .map_err(|e| KursError::Ingest(format!("Invalid lesson number: {}", e)))?;
                sections.push((
                    Lesson {
                        lesson_number: number,
                        title: caps[2].trim().to_string(),
                        lesson_link: None,
                    },
                    Vec::new(),
                ));
                continue;
            }

            match sections.last_mut() {
                Some((lesson, body)) => {
                    // A link line is only meaningful before any lesson text
                    if body.is_empty() && lesson.lesson_link.is_none() {
                        if let Some(caps) = self.lesson_link.captures(trimmed) {
                            lesson.lesson_link = non_empty(&caps[1]);
                            continue;
                        }
                    }
                    body.push(line);
                }
                None => {
                    if let Some(caps) = self.header_field.captures(trimmed) {
                        let value = caps[2].trim();
                        match caps[1].to_lowercase().as_str() {
                            "title" if !value.is_empty() => course.title = value.to_string(),
                            "link" => course.course_link = non_empty(value),
                            "instructor" => course.instructor = non_empty(value),
                            _ => {}
                        }
                    } else {
                        preamble.push(line);
                    }
                }
            }
        }

        if course.title.is_empty() {
            return Err(KursError::Ingest("Course document has no title".to_string()));
        }

        let mut chunks = Vec::new();

        if sections.is_empty() {
            for content in self.chunker.chunk(&preamble.join("\n")) {
                chunks.push(CourseChunk {
                    course_title: course.title.clone(),
                    lesson_number: None,
                    chunk_index: chunks.len(),
                    content,
                });
            }
        }

        for (lesson, body) in sections {
            for (i, content) in self.chunker.chunk(&body.join("\n")).into_iter().enumerate() {
                let content = if i == 0 {
                    format!("Lesson {} content: {}", lesson.lesson_number, content)
                } else {
                    content
                };
                chunks.push(CourseChunk {
                    course_title: course.title.clone(),
                    lesson_number: Some(lesson.lesson_number),
                    chunk_index: chunks.len(),
                    content,
                });
            }
            course.lessons.push(lesson);
        }

        debug!(
            "Parsed '{}' with {} lessons and {} chunks",
            course.title,
            course.lessons.len(),
            chunks.len()
        );

        Ok(CourseDocument { course, chunks })
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Whether a path looks like a course document.
pub fn is_course_document(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| DOCUMENT_EXTENSIONS.iter().any(|ext| e.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}
