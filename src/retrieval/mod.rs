//! Filtered retrieval over the course catalog and content indexes.
//!
//! Course names supplied by the model are rarely exact, so every course
//! filter first goes through the catalog index to find the canonical title.

use crate::embedding::Embedder;
use crate::error::{KursError, Result};
use crate::vector_store::{build_filter, Course, RetrievalFilter, SearchResults, VectorStore};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Resolves course names and runs content searches.
pub struct Retriever {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    max_results: usize,
}

impl Retriever {
    /// Create a retriever returning up to `max_results` chunks per search.
    pub fn new(store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>, max_results: usize) -> Self {
        Self {
            store,
            embedder,
            max_results,
        }
    }

    /// Map a possibly inexact course name to its canonical title.
    ///
    /// The nearest catalog entry always wins; there is no similarity cutoff.
    #[instrument(skip(self))]
    pub async fn resolve_course_name(&self, name: &str) -> Result<String> {
        let not_found = || KursError::Retrieval(format!("No course found matching '{}'", name));

        let embedding = match self.embedder.embed(name).await {
            Ok(embedding) => embedding,
            Err(e) => {
                warn!("Course name embedding failed: {}", e);
                return Err(not_found());
            }
        };

        let nearest = match self.store.search_catalog(&embedding, 1).await {
            Ok(matches) => matches.into_iter().next(),
            Err(e) => {
                warn!("Catalog lookup failed: {}", e);
                return Err(not_found());
            }
        };

        match nearest {
            Some(m) => {
                debug!(resolved = %m.course.title, distance = m.distance, "Resolved course name");
                Ok(m.course.title)
            }
            None => Err(not_found()),
        }
    }

    /// Search course content, optionally restricted to a course and/or lesson.
    ///
    /// Never fails: resolver and index errors come back as an empty result
    /// set carrying the error message.
    #[instrument(skip(self))]
    pub async fn search(
        &self,
        query: &str,
        course_name: Option<&str>,
        lesson_number: Option<i64>,
    ) -> SearchResults {
        let course_title = match course_name {
            Some(name) => match self.resolve_course_name(name).await {
                Ok(title) => Some(title),
                Err(e) => return SearchResults::empty(e.to_string()),
            },
            None => None,
        };

        let filter = build_filter(course_title.as_deref(), lesson_number);

        match self.query_content(query, filter.as_ref()).await {
            Ok(results) => results,
            Err(e) => {
                warn!("Content search failed: {}", e);
                SearchResults::empty(format!("Search error: {}", e))
            }
        }
    }

    async fn query_content(&self, query: &str, filter: Option<&RetrievalFilter>) -> Result<SearchResults> {
        debug!(filter = ?filter.map(RetrievalFilter::to_where_clause), "Querying content index");

        let embedding = self.embedder.embed(query).await?;
        let matches = self
            .store
            .search_content(&embedding, filter, self.max_results)
            .await?;

        debug!("Retrieved {} chunks", matches.len());
        Ok(SearchResults::from_matches(matches))
    }

    /// Look up the full catalog entry for a possibly inexact course name.
    pub async fn course_outline(&self, name: &str) -> Result<Course> {
        let title = self.resolve_course_name(name).await?;
        self.store
            .get_course(&title)
            .await?
            .ok_or_else(|| KursError::Retrieval(format!("No course found matching '{}'", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, FailingEmbedder, KeywordEmbedder};
    use crate::vector_store::MemoryVectorStore;

    #[tokio::test]
    async fn test_resolve_nearest_course() {
        let store = testing::seeded_store().await;
        let retriever = Retriever::new(store, Arc::new(KeywordEmbedder::new()), 5);

        assert_eq!(
            retriever.resolve_course_name("python").await.unwrap(),
            "Python Basics"
        );
        assert_eq!(
            retriever.resolve_course_name("the rust one").await.unwrap(),
            "Rust Basics"
        );
    }

    #[tokio::test]
    async fn test_unresolvable_course_returns_error_set() {
        let store = Arc::new(MemoryVectorStore::new());
        let retriever = Retriever::new(store, Arc::new(KeywordEmbedder::new()), 5);

        let results = retriever.search("x", Some("Nonexistent"), None).await;
        assert!(results.is_empty());
        assert!(results
            .error
            .as_deref()
            .unwrap()
            .contains("No course found matching 'Nonexistent'"));
    }

    #[tokio::test]
    async fn test_search_respects_filters() {
        let store = testing::seeded_store().await;
        let retriever = Retriever::new(store, Arc::new(KeywordEmbedder::new()), 5);

        let results = retriever.search("python variables", Some("python"), Some(2)).await;
        assert!(results.error.is_none());
        assert_eq!(results.len(), 1);
        assert_eq!(results.metadata[0].course_title, "Python Basics");
        assert_eq!(results.metadata[0].lesson_number, Some(2));

        let unfiltered = retriever.search("python", None, None).await;
        assert_eq!(unfiltered.len(), 3);
        assert!(unfiltered.distances.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test]
    async fn test_max_results_limits_search() {
        let store = testing::seeded_store().await;
        let retriever = Retriever::new(store, Arc::new(KeywordEmbedder::new()), 1);

        assert_eq!(retriever.search("python", None, None).await.len(), 1);
    }

    #[tokio::test]
    async fn test_index_failure_becomes_search_error() {
        let store = testing::seeded_store().await;
        let retriever = Retriever::new(store, Arc::new(FailingEmbedder), 5);

        let results = retriever.search("anything", None, None).await;
        assert!(results.is_empty());
        assert!(results.error.as_deref().unwrap().starts_with("Search error: "));

        // Resolver failures are reported as an unknown course
        let results = retriever.search("anything", Some("Python"), None).await;
        assert!(results.error.as_deref().unwrap().contains("No course found matching"));
    }

    #[tokio::test]
    async fn test_course_outline_lookup() {
        let store = testing::seeded_store().await;
        let retriever = Retriever::new(store, Arc::new(KeywordEmbedder::new()), 5);

        let course = retriever.course_outline("python").await.unwrap();
        assert_eq!(course.title, "Python Basics");
        assert_eq!(course.lessons.len(), 2);

        let empty = Retriever::new(
            Arc::new(MemoryVectorStore::new()),
            Arc::new(KeywordEmbedder::new()),
            5,
        );
        assert!(matches!(
            empty.course_outline("python").await,
            Err(KursError::Retrieval(_))
        ));
    }
}
