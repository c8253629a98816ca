//! CLI command implementations.

mod ask;
mod chat;
mod config;
mod courses;
mod load;
mod serve;

pub use ask::run_ask;
pub use chat::run_chat;
pub use config::run_config;
pub use courses::run_courses;
pub use load::run_load;
pub use serve::run_serve;
