//! Photo compositing for previews.
//!
//! Two transforms on a fixed-size square canvas, both returning a PNG data
//! URL:
//!
//! - [`Compositor::create_composite_image`] frames the uploaded photo inside
//!   a centred window ([`CompositeMode::Inset`]) or punches the window out of
//!   it ([`CompositeMode::Cutout`]).
//! - [`Compositor::create_overlay`] turns a generated illustration into an
//!   overlay with a transparent window ([`OverlayStyle::Punch`]) or a dimmed
//!   frame with a clear window ([`OverlayStyle::Dim`]).
//!
//! The window shape ([`MaskShape`]) is an explicit option for both.

pub mod geometry;
pub mod loader;
pub mod object_url;
pub mod render;

use std::sync::Arc;

use image::{DynamicImage, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub use geometry::{centered_square, window_radius, CropRect, MaskShape, Window};
pub use geometry::{DEFAULT_MARGIN, DEFAULT_OUTPUT_SIZE};
pub use loader::{decode_image, ImageFetcher, ImageLoader, ImageSource};
pub use object_url::{ObjectUrl, ObjectUrlRegistry};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// How the photo relates to the window in a composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositeMode {
    /// Photo scaled into the window; everything outside is transparent.
    #[default]
    Inset,
    /// Photo covers the canvas; the window is transparent.
    Cutout,
}

/// How a generated illustration is turned into an overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayStyle {
    /// Transparent window framed by the white border.
    #[default]
    Punch,
    /// Whole frame darkened by 50% black, window cleared.
    Dim,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeOptions {
    pub output_size: u32,
    pub margin: u32,
    pub shape: MaskShape,
    pub mode: CompositeMode,
}

impl Default for CompositeOptions {
    fn default() -> Self {
        Self {
            output_size: DEFAULT_OUTPUT_SIZE,
            margin: DEFAULT_MARGIN,
            shape: MaskShape::default(),
            mode: CompositeMode::default(),
        }
    }
}

impl CompositeOptions {
    pub fn window(&self) -> Result<Window, CoreError> {
        let radius = window_radius(self.output_size, self.margin)?;
        Ok(Window::centered(self.shape, self.output_size, radius))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayOptions {
    pub output_size: u32,
    pub margin: u32,
    pub shape: MaskShape,
    pub style: OverlayStyle,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        Self {
            output_size: DEFAULT_OUTPUT_SIZE,
            margin: DEFAULT_MARGIN,
            shape: MaskShape::default(),
            style: OverlayStyle::default(),
        }
    }
}

impl OverlayOptions {
    pub fn window(&self) -> Result<Window, CoreError> {
        let radius = window_radius(self.output_size, self.margin)?;
        Ok(Window::centered(self.shape, self.output_size, radius))
    }
}

// ---------------------------------------------------------------------------
// Pure transforms
// ---------------------------------------------------------------------------

/// Render the photo composite for `img`.
pub fn render_composite(
    img: &DynamicImage,
    options: &CompositeOptions,
) -> Result<RgbaImage, CoreError> {
    let window = options.window()?;
    let side = options.output_size;

    let canvas = match options.mode {
        CompositeMode::Inset => {
            let mut canvas = RgbaImage::new(side, side);
            let photo = render::crop_square_scaled(img, window.diameter_px());
            render::paste_centered(&mut canvas, &photo);
            render::clear_outside_window(&mut canvas, &window);
            render::stroke_border(&mut canvas, &window);
            canvas
        }
        CompositeMode::Cutout => {
            let mut canvas = render::crop_square_scaled(img, side);
            render::clear_window(&mut canvas, &window);
            render::stroke_border(&mut canvas, &window);
            canvas
        }
    };
    Ok(canvas)
}

/// Render the illustration overlay for `img`.
pub fn render_overlay(img: &DynamicImage, options: &OverlayOptions) -> Result<RgbaImage, CoreError> {
    let window = options.window()?;
    let mut canvas = render::crop_square_scaled(img, options.output_size);

    match options.style {
        OverlayStyle::Punch => {
            render::clear_window(&mut canvas, &window);
            render::stroke_border(&mut canvas, &window);
        }
        OverlayStyle::Dim => {
            render::dim(&mut canvas);
            render::clear_window(&mut canvas, &window);
        }
    }
    Ok(canvas)
}

// ---------------------------------------------------------------------------
// Compositor
// ---------------------------------------------------------------------------

/// Loads sources and runs the transforms off the async runtime.
#[derive(Clone)]
pub struct Compositor {
    loader: ImageLoader,
}

impl Compositor {
    pub fn new(loader: ImageLoader) -> Self {
        Self { loader }
    }

    pub fn loader(&self) -> &ImageLoader {
        &self.loader
    }

    /// Composite the uploaded `photo` and return a PNG data URL.
    ///
    /// The photo is read back through a temporary object URL which is
    /// revoked exactly once when this call returns, whatever the outcome.
    pub async fn create_composite_image(
        &self,
        photo: Arc<[u8]>,
        options: CompositeOptions,
    ) -> Result<String, CoreError> {
        let url = self.loader.registry().create_object_url(photo);

        options.window()?;
        let bytes = self.loader.load_bytes(url.as_str()).await?;

        let data_url = render_blocking(move || {
            let img = decode_image(&bytes)?;
            let canvas = render_composite(&img, &options)?;
            render::to_png_data_url(&canvas)
        })
        .await?;

        tracing::debug!(
            output_size = options.output_size,
            mode = ?options.mode,
            shape = ?options.shape,
            "Composite rendered",
        );
        Ok(data_url)
    }

    /// Turn the illustration at `source` into an overlay PNG data URL.
    pub async fn create_overlay(
        &self,
        source: &str,
        options: OverlayOptions,
    ) -> Result<String, CoreError> {
        options.window()?;
        let bytes = self.loader.load_bytes(source).await?;

        let data_url = render_blocking(move || {
            let img = decode_image(&bytes)?;
            let canvas = render_overlay(&img, &options)?;
            render::to_png_data_url(&canvas)
        })
        .await?;

        tracing::debug!(
            output_size = options.output_size,
            style = ?options.style,
            shape = ?options.shape,
            "Overlay rendered",
        );
        Ok(data_url)
    }
}

async fn render_blocking<F>(job: F) -> Result<String, CoreError>
where
    F: FnOnce() -> Result<String, CoreError> + Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| CoreError::Internal(format!("Render task failed: {e}")))?
}

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::testing::{decode_data_url, png_bytes, png_data_url};
    use super::*;

    fn compositor() -> (Compositor, Arc<ObjectUrlRegistry>) {
        let registry = Arc::new(ObjectUrlRegistry::new());
        (Compositor::new(ImageLoader::local(registry.clone())), registry)
    }

    fn options(size: u32, margin: u32) -> CompositeOptions {
        CompositeOptions {
            output_size: size,
            margin,
            ..CompositeOptions::default()
        }
    }

    // -- create_composite_image ----------------------------------------------

    #[tokio::test]
    async fn composite_revokes_object_url_on_success() {
        let (compositor, registry) = compositor();

        let url = compositor
            .create_composite_image(png_bytes(300, 200).into(), options(64, 8))
            .await
            .unwrap();

        assert!(url.starts_with("data:image/png;base64,"));
        assert_eq!(registry.created_count(), 1);
        assert_eq!(registry.revoked_count(), 1);
        assert_eq!(registry.live_count(), 0);
    }

    #[tokio::test]
    async fn composite_revokes_object_url_on_decode_failure() {
        let (compositor, registry) = compositor();

        let result = compositor
            .create_composite_image(Arc::from(b"definitely not a png".to_vec()), options(64, 8))
            .await;

        assert_matches!(result, Err(CoreError::Decode(_)));
        assert_eq!(registry.created_count(), 1);
        assert_eq!(registry.revoked_count(), 1);
        assert_eq!(registry.live_count(), 0);
    }

    #[tokio::test]
    async fn oversized_margin_is_rejected_before_drawing() {
        let (compositor, registry) = compositor();

        let result = compositor
            .create_composite_image(png_bytes(32, 32).into(), options(512, 300))
            .await;

        assert_matches!(result, Err(CoreError::Validation(_)));
        assert_eq!(registry.revoked_count(), 1);
        assert_eq!(registry.live_count(), 0);
    }

    #[tokio::test]
    async fn inset_composite_shows_photo_only_inside_window() {
        let (compositor, _) = compositor();

        let url = compositor
            .create_composite_image(png_bytes(120, 80).into(), options(64, 8))
            .await
            .unwrap();
        let canvas = decode_data_url(&url);

        // radius = (32 - 8) / 2 = 12
        assert_eq!(canvas.dimensions(), (64, 64));
        assert_eq!(canvas.get_pixel(32, 32).0, [255, 0, 0, 255]);
        assert_eq!(canvas.get_pixel(0, 0).0[3], 0);
        // On the frame: 10.5px right of centre, stroke spans 4..12.
        assert_eq!(canvas.get_pixel(42, 31).0, [255, 255, 255, 255]);
    }

    #[tokio::test]
    async fn cutout_composite_clears_the_window() {
        let (compositor, _) = compositor();
        let opts = CompositeOptions {
            mode: CompositeMode::Cutout,
            shape: MaskShape::Square,
            ..options(64, 8)
        };

        let url = compositor
            .create_composite_image(png_bytes(64, 64).into(), opts)
            .await
            .unwrap();
        let canvas = decode_data_url(&url);

        assert_eq!(canvas.get_pixel(32, 32).0[3], 0);
        assert_eq!(canvas.get_pixel(0, 0).0, [255, 0, 0, 255]);
    }

    // -- create_overlay ------------------------------------------------------

    #[tokio::test]
    async fn punch_overlay_has_transparent_hole_and_ring() {
        let (compositor, _) = compositor();

        let url = compositor
            .create_overlay(&png_data_url(100, 100), OverlayOptions {
                output_size: 64,
                margin: 8,
                ..OverlayOptions::default()
            })
            .await
            .unwrap();
        let canvas = decode_data_url(&url);

        assert_eq!(canvas.get_pixel(32, 32).0[3], 0);
        assert_eq!(canvas.get_pixel(42, 31).0, [255, 255, 255, 255]);
        assert_eq!(canvas.get_pixel(1, 1).0, [255, 0, 0, 255]);
    }

    #[tokio::test]
    async fn dim_overlay_darkens_outside_and_clears_window() {
        let (compositor, _) = compositor();

        let url = compositor
            .create_overlay(&png_data_url(40, 40), OverlayOptions {
                output_size: 64,
                margin: 8,
                style: OverlayStyle::Dim,
                shape: MaskShape::Square,
            })
            .await
            .unwrap();
        let canvas = decode_data_url(&url);

        assert_eq!(canvas.get_pixel(32, 32).0[3], 0);
        assert_eq!(canvas.get_pixel(1, 1).0, [128, 0, 0, 255]);
    }

    #[tokio::test]
    async fn overlay_decode_failure_is_distinct() {
        let (compositor, _) = compositor();
        let result = compositor
            .create_overlay("data:image/png;base64,AAAA", OverlayOptions::default())
            .await;
        assert_matches!(result, Err(CoreError::Decode(_)));
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let opts: OverlayOptions = serde_json::from_str(r#"{"style":"dim"}"#).unwrap();
        assert_eq!(opts.output_size, DEFAULT_OUTPUT_SIZE);
        assert_eq!(opts.margin, DEFAULT_MARGIN);
        assert_eq!(opts.style, OverlayStyle::Dim);
        assert_eq!(opts.shape, MaskShape::Circle);
    }
}
