//! Pixel-level canvas operations on RGBA buffers.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

use super::geometry::{centered_square, Window};
use crate::error::CoreError;

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Alpha of the black layer used to dim overlays.
pub const DIM_ALPHA: f32 = 0.5;

/// Crop `img` to its centred square and scale it to `side` x `side`.
pub fn crop_square_scaled(img: &DynamicImage, side: u32) -> RgbaImage {
    let crop = centered_square(img.width(), img.height());
    let square = img.crop_imm(crop.x, crop.y, crop.size, crop.size).to_rgba8();
    if crop.size == side {
        return square;
    }
    imageops::resize(&square, side, side, FilterType::Triangle)
}

/// Make every pixel inside `window` fully transparent.
pub fn clear_window(canvas: &mut RgbaImage, window: &Window) {
    for (x, y, px) in canvas.enumerate_pixels_mut() {
        if window.contains(x, y) {
            *px = TRANSPARENT;
        }
    }
}

/// Make every pixel outside `window` fully transparent.
pub fn clear_outside_window(canvas: &mut RgbaImage, window: &Window) {
    for (x, y, px) in canvas.enumerate_pixels_mut() {
        if !window.contains(x, y) {
            *px = TRANSPARENT;
        }
    }
}

/// Paint the white frame just inside the window edge.
pub fn stroke_border(canvas: &mut RgbaImage, window: &Window) {
    for (x, y, px) in canvas.enumerate_pixels_mut() {
        if window.on_border(x, y) {
            *px = WHITE;
        }
    }
}

/// Composite a black layer of [`DIM_ALPHA`] over the whole canvas
/// (source-over).
pub fn dim(canvas: &mut RgbaImage) {
    for px in canvas.pixels_mut() {
        let [r, g, b, a] = px.0;
        let dst_a = a as f32 / 255.0;
        let out_a = DIM_ALPHA + dst_a * (1.0 - DIM_ALPHA);
        let scale = dst_a * (1.0 - DIM_ALPHA) / out_a;
        px.0 = [
            (r as f32 * scale).round() as u8,
            (g as f32 * scale).round() as u8,
            (b as f32 * scale).round() as u8,
            (out_a * 255.0).round() as u8,
        ];
    }
}

/// Paste `layer` centred on `canvas`.
pub fn paste_centered(canvas: &mut RgbaImage, layer: &RgbaImage) {
    let offset = (canvas.width().saturating_sub(layer.width()) / 2) as i64;
    imageops::overlay(canvas, layer, offset, offset);
}

/// Serialize `canvas` as a `data:image/png;base64,...` URL.
pub fn to_png_data_url(canvas: &RgbaImage) -> Result<String, CoreError> {
    let mut buf = Vec::new();
    canvas
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| CoreError::Decode(format!("Failed to encode canvas: {e}")))?;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(&buf)))
}
