//! Courses command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// List indexed courses.
pub async fn run_courses(settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;
    let courses = orchestrator.vector_store().list_courses().await?;

    if courses.is_empty() {
        Output::info("No courses indexed yet. Use 'kurs load <folder>' to add some.");
        return Ok(());
    }

    Output::header(&format!("Indexed Courses ({})", courses.len()));
    for course in &courses {
        Output::course_info(
            &course.title,
            course.lesson_count,
            course.chunk_count,
            &course.indexed_at.format("%Y-%m-%d %H:%M").to_string(),
        );
    }

    Ok(())
}
