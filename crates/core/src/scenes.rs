//! Scene summary generation: keyword validation, the fixed summary prompt,
//! and best-effort parsing of the model's numbered list.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;
use crate::upstream::{CompletionRequest, GenerativeUpstream};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum number of scenes kept from a summary.
pub const MAX_SCENES: usize = 3;

/// Sampling temperature for summary requests.
pub const SUMMARY_TEMPERATURE: f32 = 0.7;

/// Output-length ceiling for summary requests.
pub const SUMMARY_MAX_TOKENS: u32 = 150;

/// Leading list numbering such as `1.`, `2 `, `3. `.
static NUMBERING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+[.\s]*").expect("valid regex"));

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Trim `keywords` and reject empty or whitespace-only input.
pub fn validate_keywords(keywords: &str) -> Result<&str, CoreError> {
    let trimmed = keywords.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Missing keywords".to_string()));
    }
    Ok(trimmed)
}

/// Reject story text with more than [`MAX_SCENES`] scene lines. Each line
/// costs one upstream image call.
pub fn validate_story_text(text: &str) -> Result<Vec<String>, CoreError> {
    let scenes = split_story_text(text);
    if scenes.len() > MAX_SCENES {
        return Err(CoreError::Validation(format!(
            "Story has {} scenes; at most {MAX_SCENES} are allowed",
            scenes.len()
        )));
    }
    Ok(scenes)
}

// ---------------------------------------------------------------------------
// Prompt and parsing
// ---------------------------------------------------------------------------

/// Instruction asking for exactly three numbered Japanese scene summaries.
pub fn build_summary_prompt(keywords: &str) -> String {
    format!(
        "あなたは絵本作家です。次のキーワードから子ども向けの絵本のあらすじを3つのシーンに分けて日本語で書いてください。\
         各シーンは1〜2文で番号付きで改行して出力してください。キーワード: {keywords}"
    )
}

/// Split the model output into at most [`MAX_SCENES`] non-blank scenes.
///
/// Numbering is stripped when present; missing numbering or fewer lines
/// simply yield fewer scenes.
pub fn parse_scene_list(raw: &str) -> Vec<String> {
    raw.trim()
        .lines()
        .map(|line| NUMBERING_RE.replace(line.trim(), "").trim().to_string())
        .filter(|line| !line.is_empty())
        .take(MAX_SCENES)
        .collect()
}

/// Split user-edited story text into scene lines, dropping blank lines.
///
/// Unlike [`parse_scene_list`] no numbering is stripped and no cap is
/// applied; callers that pay for each line use [`validate_story_text`].
pub fn split_story_text(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// Summary operation
// ---------------------------------------------------------------------------

/// Validate `keywords`, ask the upstream model for a summary and parse it.
///
/// Blank keywords fail before the upstream is touched.
pub async fn summarize(
    upstream: &dyn GenerativeUpstream,
    keywords: &str,
) -> Result<Vec<String>, CoreError> {
    let keywords = validate_keywords(keywords)?;

    let request = CompletionRequest {
        prompt: build_summary_prompt(keywords),
        temperature: SUMMARY_TEMPERATURE,
        max_tokens: SUMMARY_MAX_TOKENS,
    };

    let raw = upstream.complete(&request).await?;
    let scenes = parse_scene_list(&raw);
    tracing::debug!(scene_count = scenes.len(), "Parsed summary scenes");
    Ok(scenes)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
