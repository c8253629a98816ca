//! Kurs - Questions and answers over course material
//!
//! Loads course documents into a vector index and answers questions about
//! them with a language model that retrieves material through tools.
//!
//! # Overview
//!
//! Kurs allows you to:
//! - Load course documents (title, instructor, lessons) into a searchable index
//! - Ask questions and get answers with the lessons they came from
//! - Chat with follow-up questions that remember the conversation
//! - Serve the same over a small HTTP API
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration and prompt templates
//! - `embedding` - Embedding generation
//! - `vector_store` - Course catalog and content indexes, retrieval filters
//! - `retrieval` - Course name resolution and filtered content search
//! - `tools` - Tools the model can call, and the registry dispatching them
//! - `llm` - Chat model boundary
//! - `agent` - Bounded multi-round tool calling loop
//! - `session` - Conversation history per session
//! - `ingest` - Course document parsing and chunking
//! - `orchestrator` - Wiring and top-level operations
//!
//! # Example
//!
//! ```rust,no_run
//! use kurs::config::Settings;
//! use kurs::orchestrator::Orchestrator;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     orchestrator.add_course_folder(Path::new("docs"), false).await?;
//!
//!     let answer = orchestrator.answer_query("What is covered in lesson 1 of MCP?", None).await?;
//!     println!("{}", answer.answer);
//!     for source in answer.sources {
//!         println!("  - {}", source);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod ingest;
pub mod llm;
pub mod openai;
pub mod orchestrator;
pub mod retrieval;
pub mod session;
pub mod tools;
pub mod vector_store;

#[cfg(test)]
mod testing;

pub use error::{KursError, Result};
