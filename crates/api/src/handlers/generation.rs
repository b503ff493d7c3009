//! Handlers for the single-step generation endpoints.
//!
//! `POST /generate-summary` turns keywords into up to three scenes;
//! `POST /generate-images` illustrates one scene from an uploaded photo.

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::Json;
use ehon_core::illustration::{illustrate_scene, validate_illustration_input};
use ehon_core::scenes::{summarize, validate_keywords};
use serde::{Deserialize, Serialize};

use super::form::UploadForm;
use super::parse_json;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SummaryRequest {
    #[serde(default)]
    pub keywords: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub scenes: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ImageResponse {
    pub url: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/generate-summary
///
/// Keywords are validated before the credential is checked, so a blank
/// request is a 400 even on an unconfigured server.
pub async fn generate_summary(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> AppResult<Json<SummaryResponse>> {
    let input: SummaryRequest = parse_json(&body?)?;
    let keywords = validate_keywords(input.keywords.as_deref().unwrap_or_default())?;
    let upstream = state.upstream()?;

    let scenes = summarize(upstream, keywords).await?;
    tracing::info!(scene_count = scenes.len(), "Summary generated");

    Ok(Json(SummaryResponse { scenes }))
}

/// POST /api/generate-images
///
/// Multipart form with an `image` file and a `story` text field holding
/// one scene. Returns the illustration URL.
pub async fn generate_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<ImageResponse>> {
    let form = UploadForm::read(multipart).await?;
    let scene = form.text("story");
    validate_illustration_input(form.photo.as_ref(), scene)?;
    let upstream = state.upstream()?;

    let (Some(photo), Some(scene)) = (form.photo.as_ref(), scene) else {
        return Err(AppError::BadRequest("Missing image or story".to_string()));
    };

    let url = illustrate_scene(upstream, photo, scene).await?;
    tracing::info!(photo_bytes = photo.bytes.len(), "Scene illustrated");

    Ok(Json(ImageResponse { url }))
}
