//! Tiled diagonal watermark

use crate::settings::WatermarkSettings;
use pdf_core::{Align, Canvas, Color};

const FONT: &str = "Helvetica-Bold";
const SIZE: f32 = 64.0;
const ANGLE: f64 = 30.0;
const STEP_X: usize = 380;
const STEP_Y: usize = 260;

pub fn watermark_color() -> Color {
    Color::rgb(0.6, 0.65, 0.75)
}

/// Tile the watermark text across the page
///
/// Does nothing unless the watermark is enabled.
pub fn draw_watermark(canvas: &mut Canvas, settings: &WatermarkSettings) {
    if !settings.enabled {
        return;
    }
    let (width, height) = (canvas.width(), canvas.height());
    let text = settings.effective_text().to_string();

    canvas.save_state();
    canvas.set_alpha(settings.effective_opacity());
    canvas.translate(width * 0.15, height * 0.25);
    canvas.rotate(ANGLE);
    for x in (0..(width * 1.2) as usize).step_by(STEP_X) {
        for y in (0..(height * 1.2) as usize).step_by(STEP_Y) {
            canvas.draw_text(&text, x as f64, y as f64, Align::Left, FONT, SIZE, watermark_color());
        }
    }
    canvas.restore_state();
}
