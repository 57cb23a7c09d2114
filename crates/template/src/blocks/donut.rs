//! Ring gauges for the page-1 percentages

use pdf_core::{Align, Canvas, Color};

pub const OUTER_RADIUS: f64 = 40.0;
pub const INNER_RADIUS: f64 = 26.0;

const LABEL_FONT: &str = "Helvetica-Bold";
const LABEL_SIZE: f32 = 12.0;

/// One ring gauge
#[derive(Debug, Clone, PartialEq)]
pub struct Donut {
    pub cx: f64,
    pub cy: f64,
    /// Filled share, 0..=100
    pub percent: f64,
    /// Centre label, `54%` when empty
    pub label: String,
}

impl Donut {
    pub fn new(cx: f64, cy: f64, percent: f64, label: impl Into<String>) -> Self {
        Self {
            cx,
            cy,
            percent,
            label: label.into(),
        }
    }

    fn label_text(&self) -> String {
        if self.label.trim().is_empty() {
            format!("{}%", self.percent.round() as i64)
        } else {
            self.label.trim().to_string()
        }
    }
}

pub fn track_color() -> Color {
    Color::rgb(0.85, 0.88, 0.90)
}

pub fn fill_color() -> Color {
    Color::rgb(0.07, 0.34, 0.60)
}

/// Draw a gauge; nothing is drawn for a non-positive share
///
/// The filled wedge starts at twelve o'clock and runs clockwise.
pub fn draw_donut(canvas: &mut Canvas, donut: &Donut) {
    if !donut.percent.is_finite() || donut.percent <= 0.0 {
        return;
    }
    let percent = donut.percent.min(100.0);

    canvas.fill_circle(donut.cx, donut.cy, OUTER_RADIUS, track_color());
    canvas.fill_ring_segment(
        donut.cx,
        donut.cy,
        OUTER_RADIUS,
        0.0,
        90.0,
        -360.0 * percent / 100.0,
        fill_color(),
    );
    canvas.fill_circle(donut.cx, donut.cy, INNER_RADIUS, Color::white());
    canvas.draw_text(
        &donut.label_text(),
        donut.cx,
        donut.cy - 6.0,
        Align::Center,
        LABEL_FONT,
        LABEL_SIZE,
        fill_color(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_percent_draws_nothing() {
        let mut canvas = Canvas::a4();
        draw_donut(&mut canvas, &Donut::new(95.0, 440.0, 0.0, "0%"));
        draw_donut(&mut canvas, &Donut::new(95.0, 440.0, f64::NAN, ""));
        assert!(canvas.is_empty());
    }

    #[test]
    fn test_donut_layers() {
        let mut canvas = Canvas::a4();
        draw_donut(&mut canvas, &Donut::new(95.0, 440.0, 54.0, ""));
        let content = String::from_utf8_lossy(canvas.content()).to_string();

        let track = content.find("0.85 0.88 0.9 rg").unwrap();
        let fill = content.find("0.07 0.34 0.6 rg").unwrap();
        let hole = content.find("1 1 1 rg").unwrap();
        assert!(track < fill && fill < hole);
        // wedge starts at twelve o'clock
        assert!(content.contains("95 480 m"));
        assert!(content.contains("(54%) Tj"));
    }

    #[test]
    fn test_explicit_label() {
        let mut canvas = Canvas::a4();
        draw_donut(&mut canvas, &Donut::new(210.0, 440.0, 120.0, " 70% "));
        let content = String::from_utf8_lossy(canvas.content()).to_string();
        assert!(content.contains("(70%) Tj"));
    }
}
