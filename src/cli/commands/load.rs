//! Load command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Load a course document or a folder of them into the index.
pub async fn run_load(path: &str, clear: bool, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Load, &settings.model) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let path = Settings::expand_path(path);
    let orchestrator = Orchestrator::new(settings)?;

    if path.is_dir() {
        let spinner = Output::spinner(&format!("Loading courses from {}...", path.display()));
        let result = orchestrator.add_course_folder(&path, clear).await;
        spinner.finish_and_clear();

        let (courses, chunks) = result?;
        if courses == 0 {
            Output::info("No new courses found.");
        } else {
            Output::success(&format!("Loaded {} courses with {} chunks", courses, chunks));
        }
    } else {
        if clear {
            orchestrator.vector_store().clear().await?;
        }

        let spinner = Output::spinner(&format!("Loading {}...", path.display()));
        let result = orchestrator.add_course_document(&path).await;
        spinner.finish_and_clear();

        let (course, chunks) = result?;
        Output::success(&format!(
            "Loaded {} ({} lessons, {} chunks)",
            course.title,
            course.lessons.len(),
            chunks
        ));
    }

    Ok(())
}
