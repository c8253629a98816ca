//! Conversation sessions.
//!
//! Keeps the last few question/answer exchanges per session id so follow-up
//! questions can be answered in context. Sessions live in memory only.

use crate::error::{KursError, Result};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

#[derive(Debug, Clone)]
struct Exchange {
    query: String,
    answer: String,
}

#[derive(Debug, Default)]
struct Sessions {
    counter: u64,
    history: HashMap<String, Vec<Exchange>>,
}

/// In-memory store of bounded conversation histories.
#[derive(Debug)]
pub struct SessionManager {
    max_history: usize,
    inner: Mutex<Sessions>,
}

impl SessionManager {
    /// Create a manager keeping up to `max_history` exchanges per session.
    pub fn new(max_history: usize) -> Self {
        Self {
            max_history,
            inner: Mutex::new(Sessions::default()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Sessions>> {
        self.inner
            .lock()
            .map_err(|e| KursError::Session(format!("Failed to acquire lock: {}", e)))
    }

    /// Start a new, empty session and return its id.
    pub fn create_session(&self) -> Result<String> {
        let mut sessions = self.lock()?;
        sessions.counter += 1;
        let id = format!("session_{}", sessions.counter);
        sessions.history.insert(id.clone(), Vec::new());
        debug!("Created {}", id);
        Ok(id)
    }

    /// Record an exchange, creating the session if it is unknown.
    pub fn add_exchange(&self, session_id: &str, query: &str, answer: &str) -> Result<()> {
        let mut sessions = self.lock()?;
        let history = sessions.history.entry(session_id.to_string()).or_default();

        history.push(Exchange {
            query: query.to_string(),
            answer: answer.to_string(),
        });

        if history.len() > self.max_history {
            let excess = history.len() - self.max_history;
            history.drain(..excess);
        }

        Ok(())
    }

    /// Formatted history for a session, or `None` when it has none.
    pub fn get_history(&self, session_id: &str) -> Result<Option<String>> {
        let sessions = self.lock()?;

        let formatted = sessions
            .history
            .get(session_id)
            .filter(|h| !h.is_empty())
            .map(|history| {
                history
                    .iter()
                    .map(|e| format!("User: {}\nAssistant: {}", e.query, e.answer))
                    .collect::<Vec<_>>()
                    .join("\n")
            });

        Ok(formatted)
    }

    /// Forget a session's history.
    pub fn clear_session(&self, session_id: &str) -> Result<()> {
        if let Some(history) = self.lock()?.history.get_mut(session_id) {
            history.clear();
        }
        Ok(())
    }
}
