//! Configuration module for Kurs.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{AgentPrompts, Prompts};
pub use settings::{
    EmbeddingSettings, GeneralSettings, ModelSettings, PromptSettings, RetrievalSettings,
    ServerSettings, SessionSettings, Settings, VectorStoreSettings,
};
