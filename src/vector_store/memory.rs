//! In-memory vector store implementation.
//!
//! Useful for testing and small datasets.

use super::{
    check_aligned, cosine_distance, CatalogMatch, ChunkMatch, ChunkMetadata, Course, CourseChunk,
    IndexedCourse, RetrievalFilter, VectorStore,
};
use crate::error::{KursError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

struct CatalogEntry {
    course: Course,
    embedding: Vec<f32>,
    indexed_at: DateTime<Utc>,
}

struct ContentEntry {
    content: String,
    metadata: ChunkMetadata,
    embedding: Vec<f32>,
}

/// In-memory vector store.
pub struct MemoryVectorStore {
    catalog: RwLock<BTreeMap<String, CatalogEntry>>,
    content: RwLock<BTreeMap<String, ContentEntry>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            catalog: RwLock::new(BTreeMap::new()),
            content: RwLock::new(BTreeMap::new()),
        }
    }

    fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>> {
        lock.read()
            .map_err(|e| KursError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>> {
        lock.write()
            .map_err(|e| KursError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn add_course_metadata(&self, course: &Course, title_embedding: &[f32]) -> Result<()> {
        let mut catalog = Self::write(&self.catalog)?;
        catalog.insert(
            course.title.clone(),
            CatalogEntry {
                course: course.clone(),
                embedding: title_embedding.to_vec(),
                indexed_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn add_course_content(&self, chunks: &[CourseChunk], embeddings: &[Vec<f32>]) -> Result<usize> {
        check_aligned(chunks, embeddings)?;

        let mut content = Self::write(&self.content)?;
        for (chunk, embedding) in chunks.iter().zip(embeddings) {
            content.insert(
                chunk.id(),
                ContentEntry {
                    content: chunk.content.clone(),
                    metadata: chunk.metadata(),
                    embedding: embedding.clone(),
                },
            );
        }
        Ok(chunks.len())
    }

    async fn search_catalog(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<CatalogMatch>> {
        let catalog = Self::read(&self.catalog)?;

        let mut matches: Vec<CatalogMatch> = catalog
            .values()
            .map(|entry| CatalogMatch {
                course: entry.course.clone(),
                distance: cosine_distance(query_embedding, &entry.embedding),
            })
            .collect();

        // Stable sort keeps title order among equal distances
        matches.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(std::cmp::Ordering::Equal));
        matches.truncate(limit);

        Ok(matches)
    }

    async fn search_content(
        &self,
        query_embedding: &[f32],
        filter: Option<&RetrievalFilter>,
        limit: usize,
    ) -> Result<Vec<ChunkMatch>> {
        let content = Self::read(&self.content)?;

        let mut matches: Vec<ChunkMatch> = content
            .values()
            .filter(|entry| filter.map_or(true, |f| f.matches(&entry.metadata)))
            .map(|entry| ChunkMatch {
                content: entry.content.clone(),
                metadata: entry.metadata.clone(),
                distance: cosine_distance(query_embedding, &entry.embedding),
            })
            .collect();

        matches.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(std::cmp::Ordering::Equal));
        matches.truncate(limit);

        Ok(matches)
    }

    async fn get_course(&self, title: &str) -> Result<Option<Course>> {
        let catalog = Self::read(&self.catalog)?;
        Ok(catalog.get(title).map(|entry| entry.course.clone()))
    }

    async fn list_courses(&self) -> Result<Vec<IndexedCourse>> {
        let catalog = Self::read(&self.catalog)?;
        let content = Self::read(&self.content)?;

        let courses = catalog
            .values()
            .map(|entry| IndexedCourse {
                title: entry.course.title.clone(),
                lesson_count: entry.course.lessons.len(),
                chunk_count: content
                    .values()
                    .filter(|c| c.metadata.course_title == entry.course.title)
                    .count(),
                indexed_at: entry.indexed_at,
            })
            .collect();

        Ok(courses)
    }

    async fn remove_course(&self, title: &str) -> Result<()> {
        Self::write(&self.catalog)?.remove(title);
        Self::write(&self.content)?.retain(|_, entry| entry.metadata.course_title != title);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        Self::write(&self.catalog)?.clear();
        Self::write(&self.content)?.clear();
        Ok(())
    }
}
