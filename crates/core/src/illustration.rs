//! Per-scene illustration requests.
//!
//! Each call is independent: one scene, one photo, one image. Repeating it
//! across the scenes of a story is the workflow's job.

use crate::error::CoreError;
use crate::types::Photo;
use crate::upstream::{GenerativeUpstream, IllustrationRequest};

/// Style directives placed before the scene text.
const STYLE_PREAMBLE: &str = "<IMAGE> \u{2192} Transform the input image into a hand-painted Studio Ghibli-style illustration for a children's picture book scene.\n\
\u{2022} Use a soft pastel color palette and watercolor-like textures\n\
\u{2022} Warm, natural lighting with gentle atmospheric haze\n\
\u{2022} Painterly brush strokes, delicate gradients, and subtle film grain\n";

/// Likeness instruction placed after the scene text.
const LIKENESS_INSTRUCTION: &str = "The main character should resemble the uploaded child photo. \
Place the protagonist's face at the center of the image.";

/// Check that both the photo and the scene text were supplied.
pub fn validate_illustration_input(photo: Option<&Photo>, scene: Option<&str>) -> Result<(), CoreError> {
    let has_photo = photo.is_some_and(|p| !p.is_empty());
    let has_scene = scene.is_some_and(|s| !s.trim().is_empty());
    if !has_photo || !has_scene {
        return Err(CoreError::Validation("Missing image or story".to_string()));
    }
    Ok(())
}

/// Fixed illustration template with `scene` interpolated.
pub fn build_illustration_prompt(scene: &str) -> String {
    format!("{STYLE_PREAMBLE}{}\n{LIKENESS_INSTRUCTION}", scene.trim())
}

/// Generate one illustration for `scene` conditioned on `photo`.
///
/// An empty URL from the upstream counts as a failure.
pub async fn illustrate_scene(
    upstream: &dyn GenerativeUpstream,
    photo: &Photo,
    scene: &str,
) -> Result<String, CoreError> {
    validate_illustration_input(Some(photo), Some(scene))?;

    let request = IllustrationRequest {
        prompt: build_illustration_prompt(scene),
        photo: photo.clone(),
    };

    let url = upstream.illustrate(&request).await?;
    if url.trim().is_empty() {
        return Err(CoreError::upstream("Image generation returned no URL"));
    }
    Ok(url)
}
