//! Coordinate descriptor parsing
//!
//! A descriptor lists one record per placeholder, separated by divider lines:
//!
//! ```text
//! Text: Max Mustermann
//! Position: (70,52, 118,30, 160,11, 129,80)
//! Schriftart: Helvetica-Bold
//! Schriftgröße: 10,5
//! Farbe: 0x1B3670
//! ----------------------------------------
//! ```
//!
//! Positions are in author space: origin at the top-left corner of the page,
//! y growing downward.

use lazy_static::lazy_static;
use pdf_core::Color;
use regex::Regex;
use std::path::Path;

lazy_static! {
    static ref NUMBER_RE: Regex = Regex::new(r"[-+]?[0-9]*[.,]?[0-9]+").unwrap();
}

/// Font used by records without a font line
pub const DEFAULT_FONT: &str = "Helvetica";

/// Font size used by records with a missing or unreadable size
pub const DEFAULT_FONT_SIZE: f32 = 10.0;

/// Rectangle in author space
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    /// Baseline in PDF user space on a page of `page_height`
    pub fn canvas_y(&self, page_height: f64) -> f64 {
        page_height - self.y1
    }
}

/// One placeholder record of a template page
#[derive(Debug, Clone, PartialEq)]
pub struct DrawElement {
    /// Placeholder text: a legacy sample literal or `{{key}}`
    pub text: String,
    pub rect: Rect,
    pub font_name: String,
    pub font_size: f32,
    /// 24-bit `0xRRGGBB`
    pub color: u32,
}

impl DrawElement {
    /// Color as RGB components in 0..1
    pub fn color_rgb(&self) -> (f32, f32, f32) {
        let c = self.color();
        (c.r, c.g, c.b)
    }

    pub fn color(&self) -> Color {
        Color::from_hex(self.color & 0xFF_FFFF)
    }
}

/// Fields collected for the record currently being read
#[derive(Default)]
struct PendingRecord {
    text: Option<String>,
    rect: Option<Rect>,
    font_name: Option<String>,
    font_size: Option<f32>,
    color: Option<u32>,
}

impl PendingRecord {
    /// Build the element; records without text or position are dropped
    fn finish(self) -> Option<DrawElement> {
        Some(DrawElement {
            text: self.text?,
            rect: self.rect?,
            font_name: self.font_name.unwrap_or_else(|| DEFAULT_FONT.to_string()),
            font_size: self.font_size.unwrap_or(DEFAULT_FONT_SIZE),
            color: self.color.unwrap_or(0),
        })
    }
}

/// Known record labels
enum Label {
    Text,
    Position,
    FontName,
    FontSize,
    Color,
}

fn label_kind(label: &str) -> Option<Label> {
    match label {
        "Text" => return Some(Label::Text),
        "Position" => return Some(Label::Position),
        "FontName" | "Schriftart" => return Some(Label::FontName),
        "Color" | "Farbe" => return Some(Label::Color),
        _ => {}
    }
    match label.to_lowercase().as_str() {
        "fontsize" | "schriftgröße" | "schriftgroesse" => Some(Label::FontSize),
        _ => None,
    }
}

fn is_divider(line: &str) -> bool {
    line.starts_with("---") || (line.len() >= 3 && line.chars().all(|c| c == '-'))
}

/// Extract the first four numbers of a position line
///
/// `,` counts as a decimal separator. Fewer than four numbers reject the
/// position.
fn parse_position(value: &str) -> Option<Rect> {
    let nums: Vec<f64> = NUMBER_RE
        .find_iter(value)
        .filter_map(|m| m.as_str().replace(',', ".").parse::<f64>().ok())
        .take(4)
        .collect();

    match nums.as_slice() {
        [x0, y0, x1, y1] => Some(Rect::new(*x0, *y0, *x1, *y1)),
        _ => None,
    }
}

fn parse_font_size(value: &str) -> f32 {
    value
        .replace(',', ".")
        .parse::<f32>()
        .ok()
        .filter(|size| size.is_finite())
        .unwrap_or(DEFAULT_FONT_SIZE)
}

fn parse_color(value: &str) -> u32 {
    let parsed = match value.get(..2) {
        Some(prefix) if prefix.eq_ignore_ascii_case("0x") => u32::from_str_radix(&value[2..], 16),
        _ => value.parse::<u32>(),
    };
    parsed.unwrap_or(0)
}

/// Parse descriptor text into draw elements, in file order
pub fn parse(source: &str) -> Vec<DrawElement> {
    let mut elements = Vec::new();
    let mut current = PendingRecord::default();

    for raw in source.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if is_divider(line) {
            elements.extend(std::mem::take(&mut current).finish());
            continue;
        }

        let Some((label, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();

        match label_kind(label.trim()) {
            Some(Label::Text) => current.text = Some(value.to_string()),
            Some(Label::Position) => {
                if let Some(rect) = parse_position(value) {
                    current.rect = Some(rect);
                }
            }
            Some(Label::FontName) => current.font_name = Some(value.to_string()),
            Some(Label::FontSize) => current.font_size = Some(parse_font_size(value)),
            Some(Label::Color) => current.color = Some(parse_color(value)),
            None => {}
        }
    }
    elements.extend(current.finish());

    elements
}

/// Parse a descriptor file
///
/// A missing or unreadable file yields no elements.
pub fn parse_file(path: impl AsRef<Path>) -> Vec<DrawElement> {
    let path = path.as_ref();
    if !path.exists() {
        log::debug!("coordinate file {} not found", path.display());
        return Vec::new();
    }
    match std::fs::read(path) {
        Ok(bytes) => parse(&String::from_utf8_lossy(&bytes)),
        Err(e) => {
            log::warn!("failed to read coordinate file {}: {}", path.display(), e);
            Vec::new()
        }
    }
}
