//! Vector store abstraction for Kurs.
//!
//! Two logical indexes live behind one trait: a small course catalog (one
//! entry per course, embedded on its title) used for fuzzy course-name
//! resolution, and the content index of lesson text chunks.

mod filter;
mod memory;
mod sqlite;

pub use filter::{build_filter, RetrievalFilter};
pub use memory::MemoryVectorStore;
pub use sqlite::SqliteVectorStore;

use crate::error::{KursError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A lesson within a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub lesson_number: i64,
    pub title: String,
    pub lesson_link: Option<String>,
}

/// Catalog entry for one course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    /// Course title, unique across the catalog.
    pub title: String,
    pub instructor: Option<String>,
    pub course_link: Option<String>,
    pub lessons: Vec<Lesson>,
}

impl Course {
    /// Create a course with no lessons.
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            instructor: None,
            course_link: None,
            lessons: Vec::new(),
        }
    }
}

/// A piece of lesson text to be indexed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseChunk {
    pub course_title: String,
    pub lesson_number: Option<i64>,
    /// Position of this chunk within its course.
    pub chunk_index: usize,
    pub content: String,
}

impl CourseChunk {
    /// Metadata stored alongside the chunk.
    pub fn metadata(&self) -> ChunkMetadata {
        ChunkMetadata {
            course_title: self.course_title.clone(),
            lesson_number: self.lesson_number,
            chunk_index: self.chunk_index,
        }
    }

    /// Stable identifier used for upserts.
    pub fn id(&self) -> String {
        format!("{}_{}", self.course_title.replace(' ', "_"), self.chunk_index)
    }
}

/// Metadata attached to every content chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub course_title: String,
    pub lesson_number: Option<i64>,
    pub chunk_index: usize,
}

/// A content chunk returned by a similarity query.
#[derive(Debug, Clone)]
pub struct ChunkMatch {
    pub content: String,
    pub metadata: ChunkMetadata,
    /// Cosine distance to the query (lower is closer).
    pub distance: f32,
}

/// A catalog entry returned by a similarity query.
#[derive(Debug, Clone)]
pub struct CatalogMatch {
    pub course: Course,
    pub distance: f32,
}

/// Summary information about an indexed course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedCourse {
    pub title: String,
    pub lesson_count: usize,
    pub chunk_count: usize,
    pub indexed_at: DateTime<Utc>,
}

/// Ranked result set of a content search.
///
/// `documents`, `metadata` and `distances` always have equal length and are
/// ordered closest first. The set is empty iff it has no documents, whether
/// or not `error` is set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResults {
    pub documents: Vec<String>,
    pub metadata: Vec<ChunkMetadata>,
    pub distances: Vec<f32>,
    pub error: Option<String>,
}

impl SearchResults {
    /// Build a result set from ranked matches.
    pub fn from_matches(matches: Vec<ChunkMatch>) -> Self {
        let mut results = Self::default();
        for m in matches {
            results.documents.push(m.content);
            results.metadata.push(m.metadata);
            results.distances.push(m.distance);
        }
        results
    }

    /// Empty result set carrying an error message.
    pub fn empty(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Add or replace a course in the catalog.
    async fn add_course_metadata(&self, course: &Course, title_embedding: &[f32]) -> Result<()>;

    /// Add or replace content chunks. `embeddings` must align with `chunks`.
    async fn add_course_content(&self, chunks: &[CourseChunk], embeddings: &[Vec<f32>]) -> Result<usize>;

    /// Nearest catalog entries to a query embedding, closest first.
    async fn search_catalog(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<CatalogMatch>>;

    /// Nearest content chunks satisfying `filter`, closest first.
    async fn search_content(
        &self,
        query_embedding: &[f32],
        filter: Option<&RetrievalFilter>,
        limit: usize,
    ) -> Result<Vec<ChunkMatch>>;

    /// Look up a course by exact title.
    async fn get_course(&self, title: &str) -> Result<Option<Course>>;

    /// List indexed courses ordered by title.
    async fn list_courses(&self) -> Result<Vec<IndexedCourse>>;

    /// Remove a course and all of its chunks. Unknown titles are a no-op.
    async fn remove_course(&self, title: &str) -> Result<()>;

    /// Remove everything from both indexes.
    async fn clear(&self) -> Result<()>;

    /// Titles of all indexed courses, ordered.
    async fn course_titles(&self) -> Result<Vec<String>> {
        Ok(self.list_courses().await?.into_iter().map(|c| c.title).collect())
    }

    /// Number of indexed courses.
    async fn course_count(&self) -> Result<usize> {
        Ok(self.list_courses().await?.len())
    }
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Cosine distance, in `[0, 2]`.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - cosine_similarity(a, b)
}

fn check_aligned(chunks: &[CourseChunk], embeddings: &[Vec<f32>]) -> Result<()> {
    if chunks.len() != embeddings.len() {
        return Err(KursError::VectorStore(format!(
            "Got {} chunks but {} embeddings",
            chunks.len(),
            embeddings.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);
        assert!((cosine_distance(&a, &d) - 2.0).abs() < 0.001);
    }

    #[test]
    fn test_search_results_shape() {
        let results = SearchResults::from_matches(vec![ChunkMatch {
            content: "doc".to_string(),
            metadata: ChunkMetadata {
                course_title: "C".to_string(),
                lesson_number: Some(1),
                chunk_index: 0,
            },
            distance: 0.2,
        }]);
        assert_eq!(results.len(), 1);
        assert!(!results.is_empty());
        assert!(results.error.is_none());

        let failed = SearchResults::empty("boom");
        assert!(failed.is_empty());
        assert_eq!(failed.error.as_deref(), Some("boom"));
        assert!(failed.distances.is_empty());
    }

    #[test]
    fn test_chunk_id() {
        let chunk = CourseChunk {
            course_title: "Test Course".to_string(),
            lesson_number: Some(1),
            chunk_index: 3,
            content: "x".to_string(),
        };
        assert_eq!(chunk.id(), "Test_Course_3");
    }
}
