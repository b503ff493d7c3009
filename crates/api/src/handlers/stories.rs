//! Handlers for whole-story endpoints.

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::Json;
use ehon_core::error::CoreError;
use ehon_core::scenes::validate_story_text;
use ehon_core::story::{sample_story, Story, StoryMeta};
use ehon_core::studio::StudioState;
use ehon_core::workflow::GenerationState;
use serde::Serialize;
use tokio::sync::watch;

use super::form::UploadForm;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StoryResponse {
    pub story: Story,
    /// Human-readable progress lines recorded during the run.
    pub logs: Vec<String>,
}

/// POST /api/stories
///
/// Multipart form with an `image` file plus either `keywords` (summarized
/// into scenes first) or `story` (one scene per line). Optional `title`
/// and `child_name` label the result. Scenes are illustrated one at a time
/// and the story is returned only if every scene succeeded.
pub async fn create_story(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<StoryResponse>> {
    let form = UploadForm::read(multipart).await?;

    let story_text = form.text("story");
    let keywords = form.text("keywords");
    let Some(photo) = form.photo.clone() else {
        return Err(CoreError::Validation("Missing image or story".to_string()).into());
    };
    if story_text.is_none() && keywords.is_none() {
        return Err(CoreError::Validation("Missing image or story".to_string()).into());
    }
    if let Some(text) = story_text {
        validate_story_text(text)?;
    }
    let upstream = state.upstream()?;

    let meta = StoryMeta {
        title: form.text("title").map(str::to_string),
        child_name: form.text("child_name").map(str::to_string),
    };

    let mut studio = StudioState::new()
        .with_photo(photo)
        .with_keywords(keywords.unwrap_or_default());

    studio = match story_text {
        Some(text) => studio.with_story_text(text),
        None => studio.summarize(upstream).await,
    };
    if let Some(err) = studio.last_error.take() {
        return Err(err.into());
    }

    let (notifier, progress) = watch::channel(GenerationState::Idle);
    let watcher = tokio::spawn(log_progress(progress));

    studio = studio.generate(upstream, &meta, &notifier).await;
    drop(notifier);
    match watcher.await {
        Ok(updates) => tracing::debug!(updates, "Progress watcher finished"),
        Err(err) => tracing::warn!(error = %err, "Progress watcher task failed"),
    }

    if let Some(err) = studio.last_error.take() {
        return Err(err.into());
    }

    let logs = std::mem::take(&mut studio.logs);
    let story = studio
        .open_generated()
        .current_story
        .ok_or_else(|| AppError::InternalError("Generation finished without a story".to_string()))?;

    tracing::info!(story_id = %story.id, pages = story.pages.len(), "Story created");
    Ok(Json(StoryResponse { story, logs }))
}

/// Trace every state published on `progress` until the sender is dropped.
/// Returns the number of updates seen.
async fn log_progress(mut progress: watch::Receiver<GenerationState>) -> usize {
    let mut updates = 0;
    while progress.changed().await.is_ok() {
        updates += 1;
        let current = progress.borrow_and_update().clone();
        match current.progress() {
            Some((completed, total)) => {
                tracing::debug!(completed, total, "Generation progress");
            }
            None => tracing::debug!(state = ?current, "Generation state changed"),
        }
    }
    updates
}

/// GET /api/stories/sample
pub async fn get_sample_story() -> Json<Story> {
    Json(sample_story())
}
