//! OpenAI client configuration with sensible defaults.
//!
//! Works against api.openai.com or any OpenAI-compatible endpoint set in
//! `[model] base_url`.

use crate::config::ModelSettings;
use crate::error::Result;
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Default timeout for OpenAI API requests (5 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Create an OpenAI client from model settings.
pub fn create_client(settings: &ModelSettings) -> Result<Client<OpenAIConfig>> {
    let timeout = if settings.timeout_seconds == 0 {
        DEFAULT_TIMEOUT_SECS
    } else {
        settings.timeout_seconds
    };

    create_client_with_timeout(
        settings.base_url.as_deref(),
        &settings.api_key_env,
        Duration::from_secs(timeout),
    )
}

/// Create an OpenAI client with an explicit endpoint, key variable and timeout.
pub fn create_client_with_timeout(
    base_url: Option<&str>,
    api_key_env: &str,
    timeout: Duration,
) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder().timeout(timeout).build()?;

    let mut config = OpenAIConfig::new();
    if let Ok(key) = std::env::var(api_key_env) {
        config = config.with_api_key(key);
    }
    if let Some(base) = base_url {
        config = config.with_api_base(base);
    }

    Ok(Client::with_config(config).with_http_client(http_client))
}
