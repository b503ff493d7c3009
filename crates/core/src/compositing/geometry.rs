//! Canvas geometry: centered square crop and window sizing.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Default output canvas side in pixels.
pub const DEFAULT_OUTPUT_SIZE: u32 = 512;

/// Default margin used in the window radius formula.
pub const DEFAULT_MARGIN: u32 = 80;

/// Smallest accepted output canvas side.
pub const MIN_OUTPUT_SIZE: u32 = 16;

/// Largest accepted output canvas side.
pub const MAX_OUTPUT_SIZE: u32 = 4096;

/// Width of the white frame drawn around the window.
pub const BORDER_WIDTH: f32 = 8.0;

/// Distance between the window edge and the centre line of the frame.
pub const BORDER_INSET: f32 = 4.0;

/// Shape of the window cut into the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskShape {
    #[default]
    Circle,
    Square,
}

/// Source rectangle used when cropping to a square.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub size: u32,
}

/// Largest square centred on the shorter axis of a `width` x `height` image.
pub fn centered_square(width: u32, height: u32) -> CropRect {
    let size = width.min(height);
    CropRect {
        x: (width - size) / 2,
        y: (height - size) / 2,
        size,
    }
}

/// Reject canvas sizes outside [`MIN_OUTPUT_SIZE`]..=[`MAX_OUTPUT_SIZE`].
pub fn validate_output_size(output_size: u32) -> Result<(), CoreError> {
    if !(MIN_OUTPUT_SIZE..=MAX_OUTPUT_SIZE).contains(&output_size) {
        return Err(CoreError::Validation(format!(
            "output_size must be between {MIN_OUTPUT_SIZE} and {MAX_OUTPUT_SIZE} (got {output_size})"
        )));
    }
    Ok(())
}

/// Window radius `(output_size / 2 - margin) / 2`.
///
/// A margin of half the canvas or more leaves no window; that is rejected
/// here so no drawing is ever attempted with a non-positive radius.
pub fn window_radius(output_size: u32, margin: u32) -> Result<f32, CoreError> {
    validate_output_size(output_size)?;
    let radius = (output_size as f32 / 2.0 - margin as f32) / 2.0;
    if radius <= 0.0 {
        return Err(CoreError::Validation(format!(
            "margin {margin} leaves no window on a {output_size}px canvas (must be below {})",
            output_size / 2
        )));
    }
    Ok(radius)
}

/// A window of radius `radius` centred on a square canvas of side `canvas`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    pub shape: MaskShape,
    pub center: f32,
    pub radius: f32,
}

impl Window {
    pub fn centered(shape: MaskShape, canvas: u32, radius: f32) -> Self {
        Self {
            shape,
            center: canvas as f32 / 2.0,
            radius,
        }
    }

    /// Distance from the window centre to the centre of pixel `(x, y)`,
    /// measured in the metric matching the shape (Euclidean for circles,
    /// Chebyshev for squares).
    pub fn distance(&self, x: u32, y: u32) -> f32 {
        let dx = x as f32 + 0.5 - self.center;
        let dy = y as f32 + 0.5 - self.center;
        match self.shape {
            MaskShape::Circle => (dx * dx + dy * dy).sqrt(),
            MaskShape::Square => dx.abs().max(dy.abs()),
        }
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        self.distance(x, y) <= self.radius
    }

    /// Whether pixel `(x, y)` lies on the white frame: a stroke of
    /// [`BORDER_WIDTH`] centred [`BORDER_INSET`] inside the window edge.
    pub fn on_border(&self, x: u32, y: u32) -> bool {
        let line = (self.radius - BORDER_INSET).max(0.0);
        (self.distance(x, y) - line).abs() <= BORDER_WIDTH / 2.0
    }

    /// Side of the square bounding the window, at least one pixel.
    pub fn diameter_px(&self) -> u32 {
        ((self.radius * 2.0).round() as u32).max(1)
    }
}
