//! Query orchestrator for Kurs.
//!
//! Wires settings, stores, the model and the tools together, and exposes the
//! operations the CLI and HTTP server need: answering questions, loading
//! course documents and reporting what is indexed.

use crate::agent::Agent;
use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{KursError, Result};
use crate::ingest::{is_course_document, DocumentProcessor};
use crate::llm::{ChatModel, OpenAIChatModel};
use crate::retrieval::Retriever;
use crate::session::SessionManager;
use crate::tools::{CourseOutlineTool, CourseSearchTool, ToolRegistry};
use crate::vector_store::{Course, CourseChunk, MemoryVectorStore, SqliteVectorStore, VectorStore};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Answer to a query with the sources it drew on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryAnswer {
    pub answer: String,
    pub sources: Vec<String>,
}

/// Summary of the indexed catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseAnalytics {
    pub total_courses: usize,
    pub course_titles: Vec<String>,
}

/// The main orchestrator.
pub struct Orchestrator {
    settings: Settings,
    prompts: Prompts,
    embedder: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
    model: Arc<dyn ChatModel>,
    retriever: Arc<Retriever>,
    processor: DocumentProcessor,
    sessions: SessionManager,
}

impl Orchestrator {
    /// Create an orchestrator from settings.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(settings.prompts.custom_dir.as_deref())?;

        let embedder: Arc<dyn Embedder> =
            Arc::new(OpenAIEmbedder::from_settings(&settings.model, &settings.embedding)?);

        let vector_store: Arc<dyn VectorStore> = match settings.vector_store.provider.as_str() {
            "sqlite" => Arc::new(SqliteVectorStore::new(&settings.sqlite_path())?),
            "memory" => Arc::new(MemoryVectorStore::new()),
            other => {
                return Err(KursError::Config(format!(
                    "Unknown vector store provider: {}",
                    other
                )))
            }
        };

        let model: Arc<dyn ChatModel> = Arc::new(OpenAIChatModel::from_settings(&settings.model)?);

        info!(
            "Using {} with {} vector store",
            settings.model.model, settings.vector_store.provider
        );

        Self::with_components(settings, prompts, embedder, vector_store, model)
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        embedder: Arc<dyn Embedder>,
        vector_store: Arc<dyn VectorStore>,
        model: Arc<dyn ChatModel>,
    ) -> Result<Self> {
        let retriever = Arc::new(Retriever::new(
            vector_store.clone(),
            embedder.clone(),
            settings.retrieval.max_results,
        ));
        let processor = DocumentProcessor::from_settings(&settings.retrieval)?;
        let sessions = SessionManager::new(settings.session.max_history);

        Ok(Self {
            settings,
            prompts,
            embedder,
            vector_store,
            model,
            retriever,
            processor,
            sessions,
        })
    }

    /// Get a reference to the vector store.
    pub fn vector_store(&self) -> Arc<dyn VectorStore> {
        self.vector_store.clone()
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Tools for one query. Each query gets its own source trackers so
    /// concurrent queries never see each other's sources.
    fn build_tools(&self) -> Result<Arc<ToolRegistry>> {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(CourseSearchTool::new(self.retriever.clone())))?;
        registry.register(Arc::new(CourseOutlineTool::new(self.retriever.clone())))?;
        Ok(Arc::new(registry))
    }

    /// Answer a question, using and extending the session's history.
    #[instrument(skip(self, query))]
    pub async fn answer_query(&self, query: &str, session_id: Option<&str>) -> Result<QueryAnswer> {
        let tools = self.build_tools()?;
        tools.reset_sources();

        let context = match session_id {
            Some(id) => self.sessions.get_history(id)?,
            None => None,
        };

        let mut vars = HashMap::new();
        vars.insert("query".to_string(), query.to_string());
        let prompt = Prompts::render(&self.prompts.agent.query, &vars);

        let agent = Agent::new(self.model.clone(), tools.clone(), self.prompts.agent.clone())
            .with_max_rounds(self.settings.model.max_rounds);
        let response = agent.run(&prompt, context.as_deref()).await?;

        let sources = tools.last_sources();
        tools.reset_sources();

        if let Some(id) = session_id {
            self.sessions.add_exchange(id, query, &response.answer)?;
        }

        info!(
            "Answered with {} tool calls and {} sources",
            response.tool_calls.len(),
            sources.len()
        );

        Ok(QueryAnswer {
            answer: response.answer,
            sources,
        })
    }

    /// Parse and index one course document. Returns the course and the
    /// number of chunks stored.
    #[instrument(skip(self))]
    pub async fn add_course_document(&self, path: &Path) -> Result<(Course, usize)> {
        let document = self.processor.process_file(path).await?;
        self.index_course(&document.course, &document.chunks).await?;
        Ok((document.course, document.chunks.len()))
    }

    /// Embed a course and its chunks, then store both. Nothing is written
    /// until every embedding is ready, and a failed content write removes
    /// the catalog entry again.
    async fn index_course(&self, course: &Course, chunks: &[CourseChunk]) -> Result<usize> {
        let title_embedding = self.embedder.embed(&course.title).await?;

        let embeddings = if chunks.is_empty() {
            Vec::new()
        } else {
            let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
            self.embedder.embed_batch(&texts).await?
        };

        self.check_dimensions(std::iter::once(&title_embedding).chain(&embeddings))?;

        self.vector_store
            .add_course_metadata(course, &title_embedding)
            .await?;

        if chunks.is_empty() {
            return Ok(0);
        }

        match self.vector_store.add_course_content(chunks, &embeddings).await {
            Ok(count) => Ok(count),
            Err(e) => {
                if let Err(cleanup) = self.vector_store.remove_course(&course.title).await {
                    warn!("Failed to roll back {}: {}", course.title, cleanup);
                }
                Err(e)
            }
        }
    }

    fn check_dimensions<'a>(&self, embeddings: impl IntoIterator<Item = &'a Vec<f32>>) -> Result<()> {
        let expected = self.embedder.dimensions();
        match embeddings.into_iter().find(|e| e.len() != expected) {
            Some(bad) => Err(KursError::Embedding(format!(
                "Expected {} dimensions, got {}",
                expected,
                bad.len()
            ))),
            None => Ok(()),
        }
    }

    /// Index every course document in a folder.
    ///
    /// Courses whose title is already indexed are skipped. Files that fail
    /// to parse or index are logged and skipped. Returns
    /// `(courses_added, chunks_added)`.
    #[instrument(skip(self))]
    pub async fn add_course_folder(&self, dir: &Path, clear_existing: bool) -> Result<(usize, usize)> {
        let is_dir = tokio::fs::metadata(dir).await.map(|m| m.is_dir()).unwrap_or(false);
        if !is_dir {
            return Err(KursError::InvalidInput(format!(
                "Folder {} does not exist",
                dir.display()
            )));
        }

        if clear_existing {
            info!("Clearing existing data for fresh rebuild");
            self.vector_store.clear().await?;
        }

        let mut existing: HashSet<String> =
            self.vector_store.course_titles().await?.into_iter().collect();

        let mut paths = Vec::new();
        let mut entries = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_file() && is_course_document(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        let mut courses_added = 0;
        let mut chunks_added = 0;

        for path in paths {
            let document = match self.processor.process_file(&path).await {
                Ok(document) => document,
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    continue;
                }
            };

            if existing.contains(&document.course.title) {
                info!("Course already indexed: {}", document.course.title);
                continue;
            }

            match self.index_course(&document.course, &document.chunks).await {
                Ok(count) => {
                    info!("Added course {} ({} chunks)", document.course.title, count);
                    existing.insert(document.course.title);
                    courses_added += 1;
                    chunks_added += count;
                }
                Err(e) => warn!("Failed to index {}: {}", path.display(), e),
            }
        }

        Ok((courses_added, chunks_added))
    }

    /// Number and titles of indexed courses.
    pub async fn course_analytics(&self) -> Result<CourseAnalytics> {
        let course_titles = self.vector_store.course_titles().await?;
        Ok(CourseAnalytics {
            total_courses: course_titles.len(),
            course_titles,
        })
    }
}
