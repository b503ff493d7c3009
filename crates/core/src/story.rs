//! Picture-book story model.
//!
//! A [`Story`] is only ever built from a complete set of scenes and image
//! URLs (see [`assemble_story`]); it is never mutated afterwards. Field names
//! serialize in camelCase because the object is handed straight to the
//! browser viewer.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Title given to generated stories when the caller supplies none.
pub const DEFAULT_STORY_TITLE: &str = "AI絵本";

/// Child name used when the caller supplies none.
pub const DEFAULT_CHILD_NAME: &str = "child";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Page transition played by the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PageAnimation {
    FadeIn,
    SlideLeft,
    Zoom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: String,
    pub text: String,
    /// Remote URL hosted by the image provider, or a `data:` URL.
    pub image_url: String,
    pub animation: PageAnimation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    /// Creation time in epoch milliseconds.
    pub id: String,
    pub title: String,
    pub child_name: String,
    pub created_at: Timestamp,
    pub pages: Vec<Page>,
}

/// Caller-supplied labels for a generated story.
#[derive(Debug, Clone, Default)]
pub struct StoryMeta {
    pub title: Option<String>,
    pub child_name: Option<String>,
}

impl StoryMeta {
    fn title_or_default(&self) -> String {
        non_blank(self.title.as_deref()).unwrap_or(DEFAULT_STORY_TITLE).to_string()
    }

    fn child_name_or_default(&self) -> String {
        non_blank(self.child_name.as_deref())
            .unwrap_or(DEFAULT_CHILD_NAME)
            .to_string()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

/// Build a story whose pages pair `scenes[i]` with `image_urls[i]`.
///
/// Both slices must be the same non-zero length; a mismatch means some
/// scene has no illustration and no story may be produced.
pub fn assemble_story(
    scenes: &[String],
    image_urls: &[String],
    meta: &StoryMeta,
) -> Result<Story, CoreError> {
    if scenes.is_empty() {
        return Err(CoreError::Validation(
            "A story needs at least one scene".to_string(),
        ));
    }
    if scenes.len() != image_urls.len() {
        return Err(CoreError::Internal(format!(
            "Scene/image count mismatch: {} scenes, {} images",
            scenes.len(),
            image_urls.len()
        )));
    }

    let created_at = Utc::now();
    let id = created_at.timestamp_millis().to_string();

    let pages = scenes
        .iter()
        .zip(image_urls)
        .enumerate()
        .map(|(i, (text, url))| Page {
            id: format!("{id}-{i}"),
            text: text.clone(),
            image_url: url.clone(),
            animation: PageAnimation::FadeIn,
        })
        .collect();

    Ok(Story {
        id,
        title: meta.title_or_default(),
        child_name: meta.child_name_or_default(),
        created_at,
        pages,
    })
}

/// Fixed demo story shown before anything has been generated.
pub fn sample_story() -> Story {
    let created_at = Utc::now();
    let id = created_at.timestamp_millis().to_string();

    let page = |n: usize, text: &str, image_url: &str, animation| Page {
        id: format!("{id}-{n}"),
        text: text.to_string(),
        image_url: image_url.to_string(),
        animation,
    };

    Story {
        pages: vec![
            page(
                1,
                "こんにちは！これはサンプルページ１です。",
                "/globe.svg",
                PageAnimation::FadeIn,
            ),
            page(
                2,
                "ページ２では次のシーンが登場します。",
                "/window.svg",
                PageAnimation::SlideLeft,
            ),
            page(
                3,
                "おしまい。見てくれてありがとう！",
                "/file.svg",
                PageAnimation::Zoom,
            ),
        ],
        id,
        title: "サンプル絵本".to_string(),
        child_name: "たろう".to_string(),
        created_at,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn pages_follow_scene_order() {
        let scenes = strings(&["a", "b", "c"]);
        let urls = strings(&["u1", "u2", "u3"]);
        let story = assemble_story(&scenes, &urls, &StoryMeta::default()).unwrap();

        assert_eq!(story.pages.len(), 3);
        for (i, page) in story.pages.iter().enumerate() {
            assert_eq!(page.text, scenes[i]);
            assert_eq!(page.image_url, urls[i]);
            assert_eq!(page.id, format!("{}-{i}", story.id));
            assert_eq!(page.animation, PageAnimation::FadeIn);
        }
    }

    #[test]
    fn defaults_apply_to_blank_meta() {
        let meta = StoryMeta {
            title: Some("   ".into()),
            child_name: None,
        };
        let story = assemble_story(&strings(&["a"]), &strings(&["u"]), &meta).unwrap();
        assert_eq!(story.title, DEFAULT_STORY_TITLE);
        assert_eq!(story.child_name, DEFAULT_CHILD_NAME);
    }

    #[test]
    fn caller_meta_is_trimmed() {
        let meta = StoryMeta {
            title: Some(" 犬の冒険 ".into()),
            child_name: Some("はなこ".into()),
        };
        let story = assemble_story(&strings(&["a"]), &strings(&["u"]), &meta).unwrap();
        assert_eq!(story.title, "犬の冒険");
        assert_eq!(story.child_name, "はなこ");
    }

    #[test]
    fn rejects_missing_images() {
        let result = assemble_story(
            &strings(&["a", "b"]),
            &strings(&["u1"]),
            &StoryMeta::default(),
        );
        assert_matches!(result, Err(CoreError::Internal(_)));
    }

    #[test]
    fn rejects_empty_scene_list() {
        let result = assemble_story(&[], &[], &StoryMeta::default());
        assert_matches!(result, Err(CoreError::Validation(_)));
    }

    #[test]
    fn serializes_camel_case() {
        let story = assemble_story(&strings(&["a"]), &strings(&["u"]), &StoryMeta::default())
            .unwrap();
        let json = serde_json::to_value(&story).unwrap();
        assert!(json.get("childName").is_some());
        assert!(json.get("createdAt").is_some());
        assert_eq!(json["pages"][0]["imageUrl"], "u");
        assert_eq!(json["pages"][0]["animation"], "fadeIn");
    }

    #[test]
    fn sample_story_uses_every_animation() {
        let story = sample_story();
        let animations: Vec<_> = story.pages.iter().map(|p| p.animation).collect();
        assert_eq!(
            animations,
            vec![
                PageAnimation::FadeIn,
                PageAnimation::SlideLeft,
                PageAnimation::Zoom
            ]
        );
        assert_eq!(story.pages[0].id, format!("{}-1", story.id));
    }
}
