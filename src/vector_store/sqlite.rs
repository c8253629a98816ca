//! SQLite-based vector store implementation.
//!
//! Metadata filters run in SQL; cosine distance is computed in Rust over the
//! filtered rows. For large corpora consider the sqlite-vec extension or a
//! dedicated vector database.

use super::{
    check_aligned, cosine_distance, CatalogMatch, ChunkMatch, ChunkMetadata, Course, CourseChunk,
    IndexedCourse, Lesson, RetrievalFilter, VectorStore,
};
use crate::error::{KursError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS courses (
        title TEXT PRIMARY KEY,
        instructor TEXT,
        course_link TEXT,
        lessons_json TEXT NOT NULL,
        embedding BLOB NOT NULL,
        indexed_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS chunks (
        id TEXT PRIMARY KEY,
        course_title TEXT NOT NULL,
        lesson_number INTEGER,
        chunk_index INTEGER NOT NULL,
        content TEXT NOT NULL,
        embedding BLOB NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_chunks_course ON chunks(course_title);
    CREATE INDEX IF NOT EXISTS idx_chunks_lesson ON chunks(lesson_number);
"#;

/// SQLite-based vector store.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
}

impl SqliteVectorStore {
    /// Open (or create) a SQLite vector store at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // WAL lets concurrent readers proceed while ingestion writes
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite vector store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite vector store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| KursError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    /// Serialize embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn parse_timestamp(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now())
    }

    fn course_from_row(
        title: String,
        instructor: Option<String>,
        course_link: Option<String>,
        lessons_json: &str,
    ) -> Result<Course> {
        let lessons: Vec<Lesson> = serde_json::from_str(lessons_json)?;
        Ok(Course {
            title,
            instructor,
            course_link,
            lessons,
        })
    }
}

/// Translate a filter into a SQL condition and its bound values.
fn where_clause(filter: Option<&RetrievalFilter>) -> (String, Vec<Value>) {
    match filter {
        None => (String::new(), Vec::new()),
        Some(RetrievalFilter::Course(title)) => (
            " WHERE course_title = ?1".to_string(),
            vec![Value::Text(title.clone())],
        ),
        Some(RetrievalFilter::Lesson(lesson)) => (
            " WHERE lesson_number = ?1".to_string(),
            vec![Value::Integer(*lesson)],
        ),
        Some(RetrievalFilter::CourseAndLesson {
            course_title,
            lesson_number,
        }) => (
            " WHERE course_title = ?1 AND lesson_number = ?2".to_string(),
            vec![Value::Text(course_title.clone()), Value::Integer(*lesson_number)],
        ),
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    #[instrument(skip(self, course, title_embedding), fields(title = %course.title))]
    async fn add_course_metadata(&self, course: &Course, title_embedding: &[f32]) -> Result<()> {
        let conn = self.lock()?;

        conn.execute(
            r#"
            INSERT OR REPLACE INTO courses
            (title, instructor, course_link, lessons_json, embedding, indexed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                course.title,
                course.instructor,
                course.course_link,
                serde_json::to_string(&course.lessons)?,
                Self::embedding_to_bytes(title_embedding),
                Utc::now().to_rfc3339(),
            ],
        )?;

        debug!("Stored catalog entry for {}", course.title);
        Ok(())
    }

    #[instrument(skip(self, chunks, embeddings), fields(count = chunks.len()))]
    async fn add_course_content(&self, chunks: &[CourseChunk], embeddings: &[Vec<f32>]) -> Result<usize> {
        check_aligned(chunks, embeddings)?;

        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        for (chunk, embedding) in chunks.iter().zip(embeddings) {
            tx.execute(
                r#"
                INSERT OR REPLACE INTO chunks
                (id, course_title, lesson_number, chunk_index, content, embedding)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    chunk.id(),
                    chunk.course_title,
                    chunk.lesson_number,
                    chunk.chunk_index as i64,
                    chunk.content,
                    Self::embedding_to_bytes(embedding),
                ],
            )?;
        }

        tx.commit()?;
        info!("Batch stored {} chunks", chunks.len());
        Ok(chunks.len())
    }

    #[instrument(skip(self, query_embedding))]
    async fn search_catalog(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<CatalogMatch>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            "SELECT title, instructor, course_link, lessons_json, embedding FROM courses ORDER BY title",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Vec<u8>>(4)?,
            ))
        })?;

        let mut matches = Vec::new();
        for row in rows {
            let (title, instructor, course_link, lessons_json, embedding) = row?;
            let course = Self::course_from_row(title, instructor, course_link, &lessons_json)?;
            matches.push(CatalogMatch {
                course,
                distance: cosine_distance(query_embedding, &Self::bytes_to_embedding(&embedding)),
            });
        }

        matches.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(std::cmp::Ordering::Equal));
        matches.truncate(limit);

        Ok(matches)
    }

    #[instrument(skip(self, query_embedding))]
    async fn search_content(
        &self,
        query_embedding: &[f32],
        filter: Option<&RetrievalFilter>,
        limit: usize,
    ) -> Result<Vec<ChunkMatch>> {
        let conn = self.lock()?;

        let (condition, values) = where_clause(filter);
        let sql = format!(
            "SELECT course_title, lesson_number, chunk_index, content, embedding FROM chunks{} ORDER BY id",
            condition
        );
        let mut stmt = conn.prepare(&sql)?;

        let rows = stmt.query_map(params_from_iter(values), |row| {
            let embedding: Vec<u8> = row.get(4)?;
            Ok(ChunkMatch {
                metadata: ChunkMetadata {
                    course_title: row.get(0)?,
                    lesson_number: row.get(1)?,
                    chunk_index: row.get::<_, i64>(2)? as usize,
                },
                content: row.get(3)?,
                distance: cosine_distance(query_embedding, &Self::bytes_to_embedding(&embedding)),
            })
        })?;

        let mut matches = rows.collect::<std::result::Result<Vec<_>, _>>()?;
        matches.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(std::cmp::Ordering::Equal));
        matches.truncate(limit);

        debug!("Found {} matching chunks", matches.len());
        Ok(matches)
    }

    #[instrument(skip(self))]
    async fn get_course(&self, title: &str) -> Result<Option<Course>> {
        let conn = self.lock()?;

        let row = conn.query_row(
            "SELECT title, instructor, course_link, lessons_json FROM courses WHERE title = ?1",
            params![title],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        );

        match row {
            Ok((title, instructor, course_link, lessons_json)) => Ok(Some(Self::course_from_row(
                title,
                instructor,
                course_link,
                &lessons_json,
            )?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self))]
    async fn list_courses(&self) -> Result<Vec<IndexedCourse>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT c.title, c.lessons_json, c.indexed_at,
                   (SELECT COUNT(*) FROM chunks WHERE chunks.course_title = c.title)
            FROM courses c
            ORDER BY c.title
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })?;

        let mut courses = Vec::new();
        for row in rows {
            let (title, lessons_json, indexed_at, chunk_count) = row?;
            let lessons: Vec<Lesson> = serde_json::from_str(&lessons_json)?;
            courses.push(IndexedCourse {
                title,
                lesson_count: lessons.len(),
                chunk_count: chunk_count as usize,
                indexed_at: Self::parse_timestamp(&indexed_at),
            });
        }

        Ok(courses)
    }

    #[instrument(skip(self))]
    #[instrument(skip(self))]
    async fn remove_course(&self, title: &str) -> Result<()> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        tx.execute("DELETE FROM chunks WHERE course_title = ?1", params![title])?;
        tx.execute("DELETE FROM courses WHERE title = ?1", params![title])?;
        tx.commit()?;

        debug!("Removed course {}", title);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch("DELETE FROM chunks; DELETE FROM courses;")?;
        info!("Cleared catalog and content indexes");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::build_filter;

    fn sample_course() -> Course {
        Course {
            title: "Python Basics".to_string(),
            instructor: Some("Guido".to_string()),
            course_link: Some("https://example.com/python".to_string()),
            lessons: vec![
                Lesson {
                    lesson_number: 1,
                    title: "Intro".to_string(),
                    lesson_link: Some("https://example.com/python/1".to_string()),
                },
                Lesson {
                    lesson_number: 2,
                    title: "Variables".to_string(),
                    lesson_link: None,
                },
            ],
        }
    }

    #[tokio::test]
    async fn test_sqlite_vector_store() {
        let store = SqliteVectorStore::in_memory().unwrap();

        store
            .add_course_metadata(&sample_course(), &[1.0, 0.0, 0.0])
            .await
            .unwrap();

        let chunks = vec![
            CourseChunk {
                course_title: "Python Basics".to_string(),
                lesson_number: Some(1),
                chunk_index: 0,
                content: "Python is a language".to_string(),
            },
            CourseChunk {
                course_title: "Python Basics".to_string(),
                lesson_number: Some(2),
                chunk_index: 1,
                content: "Variables hold values".to_string(),
            },
        ];
        store
            .add_course_content(&chunks, &[vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]])
            .await
            .unwrap();

        let courses = store.list_courses().await.unwrap();
        assert_eq!(courses.len(), 1);
        assert_eq!(courses[0].lesson_count, 2);
        assert_eq!(courses[0].chunk_count, 2);

        let course = store.get_course("Python Basics").await.unwrap().unwrap();
        assert_eq!(course, sample_course());
        assert!(store.get_course("Missing").await.unwrap().is_none());

        let results = store.search_content(&[1.0, 0.0, 0.0], None, 10).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].distance.abs() < 0.001);
        assert_eq!(results[0].metadata.lesson_number, Some(1));

        let filter = build_filter(Some("Python Basics"), Some(2));
        let results = store
            .search_content(&[1.0, 0.0, 0.0], filter.as_ref(), 10)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].content, "Variables hold values");

        let lesson_only = build_filter(None, Some(7));
        assert!(store
            .search_content(&[1.0, 0.0, 0.0], lesson_only.as_ref(), 10)
            .await
            .unwrap()
            .is_empty());

        let nearest = store.search_catalog(&[0.9, 0.1, 0.0], 1).await.unwrap();
        assert_eq!(nearest[0].course.title, "Python Basics");

        store.clear().await.unwrap();
        assert_eq!(store.course_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sqlite_remove_course() {
        let store = SqliteVectorStore::in_memory().unwrap();
        store
            .add_course_metadata(&sample_course(), &[1.0, 0.0])
            .await
            .unwrap();
        store
            .add_course_content(
                &[CourseChunk {
                    course_title: "Python Basics".to_string(),
                    lesson_number: Some(1),
                    chunk_index: 0,
                    content: "Python is a language".to_string(),
                }],
                &[vec![1.0, 0.0]],
            )
            .await
            .unwrap();

        store.remove_course("Python Basics").await.unwrap();

        assert_eq!(store.course_count().await.unwrap(), 0);
        assert!(store.search_content(&[1.0, 0.0], None, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sqlite_persists_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db").join("vectors.db");

        {
            let store = SqliteVectorStore::new(&path).unwrap();
            store
                .add_course_metadata(&sample_course(), &[1.0, 0.0])
                .await
                .unwrap();
        }

        let reopened = SqliteVectorStore::new(&path).unwrap();
        assert_eq!(
            reopened.course_titles().await.unwrap(),
            vec!["Python Basics".to_string()]
        );
    }
}
