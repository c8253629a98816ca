//! Pre-flight checks before operations that call the model API.
//!
//! Catches missing credentials up front instead of failing on the first
//! embedding or chat request.

use crate::config::ModelSettings;
use crate::error::{KursError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Answering questions needs the chat and embedding APIs.
    Query,
    /// Loading documents needs the embedding API.
    Load,
    /// Listing courses only reads the index.
    Browse,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &ModelSettings) -> Result<()> {
    match operation {
        Operation::Query | Operation::Load => check_api_key(settings),
        Operation::Browse => Ok(()),
    }
}

/// Check if the API key is configured.
///
/// Custom endpoints (local or proxy servers) often need no key, so the check
/// only applies to the default OpenAI endpoint.
fn check_api_key(settings: &ModelSettings) -> Result<()> {
    if settings.base_url.is_some() {
        return Ok(());
    }

    let var = &settings.api_key_env;
    match std::env::var(var) {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(KursError::Config(format!(
            "{} is empty. Set it with: export {}='sk-...'",
            var, var
        ))),
        Err(_) => Err(KursError::Config(format!(
            "{} not set. Set it with: export {}='sk-...'",
            var, var
        ))),
    }
}
