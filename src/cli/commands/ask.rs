//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(question: &str, max_rounds: Option<usize>, mut settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Query, &settings.model) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    if let Some(rounds) = max_rounds {
        settings.model.max_rounds = rounds;
    }

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Searching course materials...");

    match orchestrator.answer_query(question, None).await {
        Ok(response) => {
            spinner.finish_and_clear();
            Output::answer(&response.answer, &response.sources);
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
