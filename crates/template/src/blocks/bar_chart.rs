//! Page-3 electricity cost bar chart
//!
//! Two bars (costs without and with price increase) on a nice-scaled axis.
//! The vertical band comes from the printed axis labels of the background so
//! the bars line up with the artwork.

use offer_format::{axis_ticks, fmt_number, nice_ceiling};
use pdf_core::{Align, Canvas, Color};

pub const SEPARATOR_X: f64 = 299.0;
pub const CHART_LEFT: f64 = 341.0;
pub const CHART_WIDTH: f64 = 230.0;
pub const AXIS_X: f64 = CHART_LEFT + 4.0;
pub const BAR_WIDTH: f64 = 16.0;
const BAR_OFFSET: f64 = 36.0;
const BAR_GAP: f64 = 80.0;
const TICK_LENGTH: f64 = 3.0;
const MIN_BAND_HEIGHT: f64 = 10.0;

const LEGEND_OFFSETS: [f64; 2] = [356.62, 368.61];
const LEGEND_SQUARE: f64 = 6.0;

/// Vertical extent of the axis, as top-origin y1 values of the printed labels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisBand {
    pub top: f64,
    pub bottom: f64,
}

impl Default for AxisBand {
    fn default() -> Self {
        Self {
            top: 192.7,
            bottom: 326.1,
        }
    }
}

impl AxisBand {
    /// (bottom, top) in canvas coordinates; the band is at least 10 pt tall
    pub fn canvas_span(&self, page_height: f64) -> (f64, f64) {
        let bottom = page_height - self.bottom.max(self.top);
        let top = page_height - self.top.min(self.bottom);
        (bottom, top.max(bottom + MIN_BAND_HEIGHT))
    }
}

pub fn light_bar_color() -> Color {
    Color::rgb(0.63, 0.78, 0.90)
}

pub fn dark_bar_color() -> Color {
    Color::rgb(0.07, 0.34, 0.60)
}

/// X of the left edge of bar `index`
pub fn bar_x(index: usize) -> f64 {
    AXIS_X + BAR_OFFSET + index as f64 * (BAR_WIDTH + BAR_GAP)
}

/// Draw the chart
///
/// # Arguments
/// * `canvas` - Page canvas
/// * `band` - Axis band from the background labels
/// * `values` - Cost without and with price increase, in €
/// * `legend` - Legend labels for the two bars
pub fn draw_cost_chart(canvas: &mut Canvas, band: AxisBand, values: [f64; 2], legend: &[String]) {
    let page_height = canvas.height();
    let (bottom, top) = band.canvas_span(page_height);
    let height = top - bottom;

    let max = values.iter().copied().filter(|v| v.is_finite()).fold(0.0, f64::max);
    let ceiling = nice_ceiling(max);

    let axis_gray = Color::from_hex(0xB0B0B0);
    canvas.stroke_line(SEPARATOR_X, bottom, SEPARATOR_X, top + 8.0, 0.6, Color::from_hex(0x1B3670), None);
    canvas.stroke_line(AXIS_X, bottom, AXIS_X, top, 1.0, axis_gray, None);

    for tick in axis_ticks(ceiling) {
        let y = bottom + height * tick / ceiling;
        canvas.stroke_line(AXIS_X - TICK_LENGTH, y, AXIS_X, y, 1.0, axis_gray, None);
        if tick > 0.0 {
            canvas.stroke_line(
                AXIS_X,
                y,
                CHART_LEFT + CHART_WIDTH,
                y,
                0.5,
                Color::from_hex(0xC9D4E5),
                Some((1.0, 3.0)),
            );
        }
        canvas.draw_text(
            &fmt_number(Some(tick), 2, ""),
            AXIS_X - 6.0,
            y - 2.0,
            Align::Right,
            "Helvetica",
            6.0,
            Color::black(),
        );
    }

    let colors = [light_bar_color(), dark_bar_color()];
    for (index, (value, color)) in values.iter().zip(colors).enumerate() {
        let value = if value.is_finite() { value.max(0.0) } else { 0.0 };
        let bar_height = (value / ceiling).clamp(0.0, 1.0) * height;
        let x = bar_x(index);
        canvas.fill_rect(x, bottom, BAR_WIDTH, bar_height, color);
        canvas.draw_text(
            &fmt_number(Some(value), 2, "€"),
            x + BAR_WIDTH / 2.0,
            bottom + bar_height + 12.0,
            Align::Center,
            "Helvetica-Bold",
            10.49,
            Color::black(),
        );
    }

    canvas.stroke_line(AXIS_X, bottom, CHART_LEFT + CHART_WIDTH, bottom, 1.0, axis_gray, None);

    for ((label, offset), color) in legend.iter().zip(LEGEND_OFFSETS).zip(colors) {
        let x = CHART_LEFT + 12.0;
        let y = page_height - offset;
        canvas.fill_rect(x, y, LEGEND_SQUARE, LEGEND_SQUARE, color);
        canvas.draw_text(label, x + LEGEND_SQUARE + 4.0, y + 1.0, Align::Left, "Helvetica", 7.98, Color::black());
    }
}
