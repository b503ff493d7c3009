//! Session state for one picture-book authoring session.
//!
//! Every action takes the state by value and returns the next state, so a
//! caller always holds exactly one consistent snapshot. Actions never fail:
//! problems are recorded in `logs` and `last_error` and the state moves on.

use tokio::sync::watch;

use crate::error::CoreError;
use crate::scenes::{split_story_text, summarize};
use crate::story::{sample_story, Story, StoryMeta};
use crate::types::Photo;
use crate::upstream::GenerativeUpstream;
use crate::workflow::{generate_story, GenerationState};

#[derive(Debug, Default)]
pub struct StudioState {
    pub keywords: String,
    /// One scene per line.
    pub story_text: String,
    pub photo: Option<Photo>,
    pub generation: GenerationState,
    pub generated_story: Option<Story>,
    /// Story currently opened for viewing.
    pub current_story: Option<Story>,
    pub logs: Vec<String>,
    pub last_error: Option<CoreError>,
}

impl StudioState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keywords(mut self, keywords: impl Into<String>) -> Self {
        self.keywords = keywords.into();
        self
    }

    pub fn with_story_text(mut self, text: impl Into<String>) -> Self {
        self.story_text = text.into();
        self
    }

    pub fn with_photo(mut self, photo: Photo) -> Self {
        self.photo = Some(photo);
        self
    }

    fn log(&mut self, line: impl Into<String>) {
        let line = line.into();
        tracing::debug!(%line, "Studio log");
        self.logs.push(line);
    }

    fn record_error(&mut self, err: CoreError) {
        self.log(format!("エラー: {}", user_message(&err)));
        self.last_error = Some(err);
    }

    /// Summarize `keywords` into scenes, one per line of `story_text`.
    pub async fn summarize(mut self, upstream: &dyn GenerativeUpstream) -> Self {
        if self.keywords.trim().is_empty() {
            self.log("キーワードを入力してください");
            self.last_error = Some(CoreError::Validation("Missing keywords".to_string()));
            return self;
        }

        self.log("あらすじ生成リクエストを送信します");
        match summarize(upstream, &self.keywords).await {
            Ok(scenes) => {
                self.story_text = scenes.join("\n");
                self.last_error = None;
                self.log("あらすじを生成しました");
            }
            Err(err) => self.record_error(err),
        }
        self
    }

    /// Illustrate every line of `story_text` with `photo`.
    ///
    /// `notifier` receives each [`GenerationState`] transition; the final
    /// state is also kept in `generation`.
    pub async fn generate(
        mut self,
        upstream: &dyn GenerativeUpstream,
        meta: &StoryMeta,
        notifier: &watch::Sender<GenerationState>,
    ) -> Self {
        let scenes = split_story_text(&self.story_text);
        let photo = match self.photo.as_ref() {
            Some(photo) if !photo.is_empty() && !scenes.is_empty() => photo.clone(),
            _ => {
                self.log("画像または物語のテキストが不足しています");
                self.last_error = Some(CoreError::Validation("Missing image or story".to_string()));
                return self;
            }
        };

        self.log("画像生成リクエストを送信します");
        self.generation = GenerationState::Running {
            completed: 0,
            total: scenes.len(),
        };

        match generate_story(upstream, &photo, &scenes, meta, notifier).await {
            Ok(story) => {
                self.log(format!("{}枚の画像を生成しました", story.pages.len()));
                self.generation = GenerationState::Completed {
                    story: story.clone(),
                };
                self.generated_story = Some(story);
                self.last_error = None;
            }
            Err(failure) => {
                self.generation = GenerationState::Failed {
                    completed: failure.completed,
                    total: failure.total,
                    error: failure.source.to_string(),
                };
                self.log(format!(
                    "{}/{}枚目で停止しました",
                    failure.failed_scene, failure.total
                ));
                self.record_error(failure.source);
            }
        }
        self
    }

    /// Open the built-in sample story.
    pub fn show_sample(mut self) -> Self {
        self.log("サンプルストーリーを生成します");
        self.current_story = Some(sample_story());
        self
    }

    /// Open the last generated story, if any.
    pub fn open_generated(mut self) -> Self {
        if let Some(story) = self.generated_story.clone() {
            self.current_story = Some(story);
        }
        self
    }
}

fn user_message(err: &CoreError) -> &str {
    match err {
        CoreError::Validation(msg)
        | CoreError::Configuration(msg)
        | CoreError::Decode(msg)
        | CoreError::Network(msg)
        | CoreError::Internal(msg) => msg,
        CoreError::Upstream { message, .. } => message,
    }
}
