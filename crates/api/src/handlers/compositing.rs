//! Handlers for preview compositing.
//!
//! Both endpoints return `{ "data_url": "data:image/png;base64,..." }`.

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::Json;
use ehon_core::compositing::{
    CompositeMode, CompositeOptions, MaskShape, OverlayOptions, OverlayStyle,
};
use ehon_core::error::CoreError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::form::UploadForm;
use super::parse_json;
use crate::error::AppResult;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

/// Request body for `POST /overlay`.
#[derive(Debug, Deserialize, Validate)]
pub struct OverlayRequest {
    /// `data:`, `blob:` or `http(s)` URL of the illustration.
    #[validate(length(min = 1, message = "url is required"))]
    pub url: String,
    #[validate(range(min = 16, max = 4096))]
    pub output_size: Option<u32>,
    pub margin: Option<u32>,
    pub shape: Option<MaskShape>,
    pub style: Option<OverlayStyle>,
}

impl OverlayRequest {
    fn options(&self) -> OverlayOptions {
        let defaults = OverlayOptions::default();
        OverlayOptions {
            output_size: self.output_size.unwrap_or(defaults.output_size),
            margin: self.margin.unwrap_or(defaults.margin),
            shape: self.shape.unwrap_or(defaults.shape),
            style: self.style.unwrap_or(defaults.style),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CompositeResponse {
    pub data_url: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/composite
///
/// Multipart form with an `image` file and optional `output_size`,
/// `margin`, `shape` (`circle` | `square`) and `mode` (`inset` | `cutout`)
/// text fields.
pub async fn create_composite(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<CompositeResponse>> {
    let form = UploadForm::read(multipart).await?;
    let photo = form
        .photo
        .as_ref()
        .ok_or_else(|| CoreError::Validation("Missing image".to_string()))?;

    let defaults = CompositeOptions::default();
    let options = CompositeOptions {
        output_size: parse_number(&form, "output_size")?.unwrap_or(defaults.output_size),
        margin: parse_number(&form, "margin")?.unwrap_or(defaults.margin),
        shape: parse_keyword::<MaskShape>(&form, "shape")?.unwrap_or(defaults.shape),
        mode: parse_keyword::<CompositeMode>(&form, "mode")?.unwrap_or(defaults.mode),
    };

    let data_url = state
        .compositor
        .create_composite_image(photo.bytes.clone(), options)
        .await?;
    Ok(Json(CompositeResponse { data_url }))
}

/// POST /api/overlay
pub async fn create_overlay(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> AppResult<Json<CompositeResponse>> {
    let input: OverlayRequest = parse_json(&body?)?;
    input
        .validate()
        .map_err(|e| CoreError::Validation(e.to_string()))?;

    let data_url = state
        .compositor
        .create_overlay(&input.url, input.options())
        .await?;
    Ok(Json(CompositeResponse { data_url }))
}

// ---------------------------------------------------------------------------
// Form field parsing
// ---------------------------------------------------------------------------

fn parse_number(form: &UploadForm, name: &str) -> Result<Option<u32>, CoreError> {
    form.text(name)
        .map(|raw| {
            raw.parse::<u32>().map_err(|_| {
                CoreError::Validation(format!("{name} must be a non-negative integer"))
            })
        })
        .transpose()
}

/// Parse a snake_case enum keyword such as `square` or `cutout`.
fn parse_keyword<T: DeserializeOwned>(form: &UploadForm, name: &str) -> Result<Option<T>, CoreError> {
    form.text(name)
        .map(|raw| {
            serde_json::from_value(serde_json::Value::String(raw.to_ascii_lowercase()))
                .map_err(|_| CoreError::Validation(format!("Unsupported {name}: {raw}")))
        })
        .transpose()
}
