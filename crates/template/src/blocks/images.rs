//! Base64 image payloads and fitted placement

use crate::{Result, TemplateError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::ImageReader;
use pdf_core::{calculate_scaled_dimensions, detect_format, Canvas, ImageScaleMode};
use std::io::Cursor;

/// Decode a base64 PNG or JPEG, optionally wrapped in a data URL
///
/// # Arguments
/// * `payload` - Raw base64 or `data:image/png;base64,...`
///
/// # Returns
/// The image bytes; SVG and unknown formats are rejected
pub fn decode_image_payload(payload: &str) -> Result<Vec<u8>> {
    let trimmed = payload.trim();
    if trimmed.is_empty() {
        return Err(TemplateError::ImageError("empty image payload".to_string()));
    }

    let body = match trimmed.split_once(";base64,") {
        Some((prefix, body)) => {
            if prefix.to_lowercase().contains("svg") {
                return Err(TemplateError::UnsupportedImage("image/svg+xml".to_string()));
            }
            body
        }
        None => trimmed,
    };

    let compact: String = body.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| TemplateError::ImageError(format!("invalid base64: {e}")))?;

    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(64)]).to_string();
    let head = head.trim_start();
    if head.starts_with("<?xml") || head.starts_with("<svg") {
        return Err(TemplateError::UnsupportedImage("svg".to_string()));
    }

    detect_format(&bytes)?;
    Ok(bytes)
}

/// Size an image takes when fitted into a box, keeping its aspect ratio
pub fn fitted_size(data: &[u8], box_width: f64, box_height: f64) -> Result<(f64, f64)> {
    let (width, height) = ImageReader::new(Cursor::new(data))
        .with_guessed_format()?
        .into_dimensions()
        .map_err(|e| TemplateError::ImageError(e.to_string()))?;
    Ok(calculate_scaled_dimensions(
        width,
        height,
        box_width,
        box_height,
        ImageScaleMode::FitBox,
    ))
}

/// Draw a payload fitted and centred in a box whose bottom-left corner is (x, y)
pub fn draw_fitted(
    canvas: &mut Canvas,
    payload: &str,
    x: f64,
    y: f64,
    box_width: f64,
    box_height: f64,
) -> Result<(f64, f64)> {
    let bytes = decode_image_payload(payload)?;
    draw_centred(canvas, &bytes, x, y, box_width, box_height)
}

/// Draw decoded image bytes fitted and centred in a box
pub fn draw_centred(
    canvas: &mut Canvas,
    bytes: &[u8],
    x: f64,
    y: f64,
    box_width: f64,
    box_height: f64,
) -> Result<(f64, f64)> {
    let (width, height) = fitted_size(bytes, box_width, box_height)?;
    Ok(canvas.draw_image(
        bytes,
        x + (box_width - width) / 2.0,
        y + (box_height - height) / 2.0,
        box_width,
        box_height,
        ImageScaleMode::FitBox,
    )?)
}

/// Draw a payload fitted into a box, hanging from the top edge at `top`
pub fn draw_hanging(
    canvas: &mut Canvas,
    payload: &str,
    x: f64,
    top: f64,
    box_width: f64,
    box_height: f64,
) -> Result<(f64, f64)> {
    let bytes = decode_image_payload(payload)?;
    let (_, height) = fitted_size(&bytes, box_width, box_height)?;
    Ok(canvas.draw_image(
        &bytes,
        x,
        top - height,
        box_width,
        box_height,
        ImageScaleMode::FitBox,
    )?)
}
