//! Deterministic doubles for unit tests.

use crate::embedding::Embedder;
use crate::error::{KursError, Result};
use crate::llm::{ChatModel, ChatRequest, ModelTurn, ToolCallRequest};
use crate::tools::{Tool, ToolSpec};
use crate::vector_store::{Course, CourseChunk, Lesson, MemoryVectorStore, VectorStore};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

const KEYWORDS: &[&str] = &[
    "python", "rust", "variable", "loop", "mcp", "chroma", "lesson", "course",
];

/// Embeds text as keyword counts, plus a constant bias dimension so no
/// vector is all zeros.
#[derive(Debug, Default)]
pub struct KeywordEmbedder;

impl KeywordEmbedder {
    pub fn new() -> Self {
        Self
    }

    pub fn vector(&self, text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        let mut vector: Vec<f32> = KEYWORDS
            .iter()
            .map(|k| lower.matches(k).count() as f32)
            .collect();
        vector.push(0.1);
        vector
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vector(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        KEYWORDS.len() + 1
    }
}

/// Embedder whose every call fails.
pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(KursError::Embedding("embedding service unavailable".to_string()))
    }

    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(KursError::Embedding("embedding service unavailable".to_string()))
    }

    fn dimensions(&self) -> usize {
        0
    }
}

/// How a [`FaultyEmbedder`] misbehaves.
#[derive(Debug, Clone, Copy)]
pub enum EmbedFault {
    /// `embed` works, `embed_batch` fails.
    BatchFails,
    /// `embed_batch` returns one embedding fewer than asked for.
    ShortBatch,
    /// Reports one more dimension than it produces.
    WrongDimensions,
}

/// [`KeywordEmbedder`] with one injected fault.
pub struct FaultyEmbedder {
    inner: KeywordEmbedder,
    fault: EmbedFault,
}

impl FaultyEmbedder {
    pub fn new(fault: EmbedFault) -> Self {
        Self {
            inner: KeywordEmbedder::new(),
            fault,
        }
    }
}

#[async_trait]
impl Embedder for FaultyEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.inner.embed(text).await
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        match self.fault {
            EmbedFault::BatchFails => Err(KursError::Embedding("batch rejected".to_string())),
            EmbedFault::ShortBatch => {
                let mut embeddings = self.inner.embed_batch(texts).await?;
                embeddings.pop();
                Ok(embeddings)
            }
            EmbedFault::WrongDimensions => self.inner.embed_batch(texts).await,
        }
    }

    fn dimensions(&self) -> usize {
        match self.fault {
            EmbedFault::WrongDimensions => self.inner.dimensions() + 1,
            _ => self.inner.dimensions(),
        }
    }
}

pub fn embed(embedder: &KeywordEmbedder, text: &str) -> Vec<f32> {
    embedder.vector(text)
}

fn lesson(number: i64, title: &str, link: Option<&str>) -> Lesson {
    Lesson {
        lesson_number: number,
        title: title.to_string(),
        lesson_link: link.map(str::to_string),
    }
}

/// The "Python Basics" course used across tests.
pub fn python_course() -> Course {
    Course {
        title: "Python Basics".to_string(),
        instructor: Some("Ada Lovelace".to_string()),
        course_link: Some("https://example.com/python".to_string()),
        lessons: vec![
            lesson(1, "Getting Started", Some("https://example.com/python/1")),
            lesson(2, "Variables", None),
        ],
    }
}

/// A memory store holding two courses and three chunks, embedded with
/// [`KeywordEmbedder`].
pub async fn seeded_store() -> Arc<MemoryVectorStore> {
    let store = Arc::new(MemoryVectorStore::new());
    let embedder = KeywordEmbedder::new();

    let rust = Course {
        title: "Rust Basics".to_string(),
        instructor: None,
        course_link: None,
        lessons: vec![lesson(1, "Ownership", None)],
    };

    for course in [python_course(), rust] {
        store
            .add_course_metadata(&course, &embedder.vector(&course.title))
            .await
            .unwrap();
    }

    let chunks = vec![
        CourseChunk {
            course_title: "Python Basics".to_string(),
            lesson_number: Some(1),
            chunk_index: 0,
            content: "Python is a programming language.".to_string(),
        },
        CourseChunk {
            course_title: "Python Basics".to_string(),
            lesson_number: Some(2),
            chunk_index: 1,
            content: "Python variables hold values.".to_string(),
        },
        CourseChunk {
            course_title: "Rust Basics".to_string(),
            lesson_number: Some(1),
            chunk_index: 0,
            content: "Rust ownership rules.".to_string(),
        },
    ];
    let embeddings: Vec<Vec<f32>> = chunks.iter().map(|c| embedder.vector(&c.content)).collect();
    store.add_course_content(&chunks, &embeddings).await.unwrap();

    store
}

pub fn call(id: &str, name: &str, arguments: &str) -> ToolCallRequest {
    ToolCallRequest {
        id: id.to_string(),
        name: name.to_string(),
        arguments: arguments.to_string(),
    }
}

/// Chat model replaying a fixed script of turns and recording every request.
///
/// Running past the end of the script is a transport error.
#[derive(Default)]
pub struct ScriptedModel {
    turns: Mutex<VecDeque<ModelTurn>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedModel {
    pub fn new(turns: Vec<ModelTurn>) -> Self {
        Self {
            turns: Mutex::new(turns.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(&self, request: ChatRequest) -> Result<ModelTurn> {
        self.requests.lock().unwrap().push(request);
        self.turns
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| KursError::ModelTransport("script exhausted".to_string()))
    }
}

/// Tool echoing its arguments back.
pub struct EchoTool {
    name: String,
}

impl EchoTool {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

#[async_trait]
impl Tool for EchoTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name.clone(),
            description: "Echo the arguments".to_string(),
            parameters: Vec::new(),
        }
    }

    async fn execute(&self, args: Value) -> Result<String> {
        Ok(format!("echo: {}", args))
    }
}

/// Tool that always fails.
pub struct FailingTool;

#[async_trait]
impl Tool for FailingTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "explode".to_string(),
            description: "Always fails".to_string(),
            parameters: Vec::new(),
        }
    }

    async fn execute(&self, _args: Value) -> Result<String> {
        Err(KursError::ToolExecution("boom".to_string()))
    }
}
