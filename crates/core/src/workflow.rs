//! Multi-scene story generation.
//!
//! ```text
//! Idle -> Running { completed, total } -> Completed(Story)
//!                                      \-> Failed { completed, total, error }
//! ```
//!
//! Every transition is published on a [`watch`] channel so observers (the
//! HTTP layer, a UI bridge) can follow progress without polling.

use serde::Serialize;
use tokio::sync::watch;

use crate::batch::{run_sequential, BatchOutcome, FailurePolicy, Progress};
use crate::error::CoreError;
use crate::illustration::illustrate_scene;
use crate::story::{assemble_story, Story, StoryMeta};
use crate::types::Photo;
use crate::upstream::GenerativeUpstream;

/// Observable state of one generation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GenerationState {
    #[default]
    Idle,
    Running { completed: usize, total: usize },
    Completed { story: Story },
    Failed {
        completed: usize,
        total: usize,
        error: String,
    },
}

impl GenerationState {
    pub fn is_running(&self) -> bool {
        matches!(self, GenerationState::Running { .. })
    }

    /// `(completed, total)` for running and failed runs.
    pub fn progress(&self) -> Option<(usize, usize)> {
        match self {
            GenerationState::Running { completed, total }
            | GenerationState::Failed {
                completed, total, ..
            } => Some((*completed, *total)),
            _ => None,
        }
    }
}

/// A failed run: how far it got and why it stopped.
#[derive(Debug, thiserror::Error)]
#[error("Generation stopped at scene {failed_scene} ({completed}/{total} done): {source}")]
pub struct GenerationFailure {
    pub completed: usize,
    pub total: usize,
    /// 1-based index of the scene that failed.
    pub failed_scene: usize,
    #[source]
    pub source: CoreError,
}

/// Illustrate every scene in order with the same photo and assemble a story.
///
/// Runs strictly sequentially and aborts on the first failed scene; no
/// story is produced unless every scene yielded a URL.
pub async fn generate_story(
    upstream: &dyn GenerativeUpstream,
    photo: &Photo,
    scenes: &[String],
    meta: &StoryMeta,
    notifier: &watch::Sender<GenerationState>,
) -> Result<Story, GenerationFailure> {
    let total = scenes.len();

    if scenes.is_empty() {
        let source = CoreError::Validation("Missing image or story".to_string());
        return Err(fail(notifier, Progress { completed: 0, total }, 0, source));
    }

    let outcome = run_sequential(
        scenes,
        FailurePolicy::AbortOnFirst,
        |index, scene| {
            tracing::info!(scene = index + 1, total, "Requesting scene illustration");
            illustrate_scene(upstream, photo, scene)
        },
        |progress| {
            notifier.send_replace(GenerationState::Running {
                completed: progress.completed,
                total: progress.total,
            });
        },
    )
    .await;

    let urls = match outcome {
        BatchOutcome::Completed(urls) => urls,
        BatchOutcome::Failed {
            progress,
            index,
            error,
            ..
        } => {
            tracing::error!(
                scene = index + 1,
                completed = progress.completed,
                total,
                error = %error,
                "Scene illustration failed, aborting run",
            );
            return Err(fail(notifier, progress, index + 1, error));
        }
    };

    match assemble_story(scenes, &urls, meta) {
        Ok(story) => {
            tracing::info!(story_id = %story.id, pages = story.pages.len(), "Story assembled");
            notifier.send_replace(GenerationState::Completed {
                story: story.clone(),
            });
            Ok(story)
        }
        Err(source) => Err(fail(
            notifier,
            Progress {
                completed: urls.len(),
                total,
            },
            total,
            source,
        )),
    }
}

fn fail(
    notifier: &watch::Sender<GenerationState>,
    progress: Progress,
    failed_scene: usize,
    source: CoreError,
) -> GenerationFailure {
    notifier.send_replace(GenerationState::Failed {
        completed: progress.completed,
        total: progress.total,
        error: source.to_string(),
    });
    GenerationFailure {
        completed: progress.completed,
        total: progress.total,
        failed_scene,
        source,
    }
}
