//! Single-page drawing surface producing a standalone overlay PDF
//!
//! A [`Canvas`] buffers content operators in PDF user space (origin at the
//! bottom-left) and collects the fonts, images and transparency states they
//! reference. [`Canvas::finish`] writes everything into a one-page document
//! that can be stamped onto a template page.

use crate::font::{encode_win_ansi, FontData, FontRef, StandardFont};
use crate::image::{
    calculate_scaled_dimensions, generate_image_operators, ImageScaleMode, ImageXObject,
};
use crate::text::{encode_literal, generate_text_operators, pdf_num as n, TextRenderContext};
use crate::{Align, PdfError, Result};
use lopdf::{Dictionary, Document, Object, Stream};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// A4 width in points
pub const A4_WIDTH: f64 = 595.28;
/// A4 height in points
pub const A4_HEIGHT: f64 = 841.89;

/// RGB Color (values 0.0 - 1.0)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    /// Create a new RGB color (values 0.0 - 1.0)
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Create color from RGB values (0-255)
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }

    /// Create color from a `0xRRGGBB` value
    pub fn from_hex(hex: u32) -> Self {
        Self::from_rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }

    /// Gray level (0.0 black - 1.0 white)
    pub fn gray(level: f32) -> Self {
        Self::rgb(level, level, level)
    }

    /// Black color
    pub fn black() -> Self {
        Self::rgb(0.0, 0.0, 0.0)
    }

    /// White color
    pub fn white() -> Self {
        Self::rgb(1.0, 1.0, 1.0)
    }

    fn fill_op(&self) -> String {
        format!(
            "{} {} {} rg\n",
            n(self.r as f64),
            n(self.g as f64),
            n(self.b as f64)
        )
    }

    fn stroke_op(&self) -> String {
        format!(
            "{} {} {} RG\n",
            n(self.r as f64),
            n(self.g as f64),
            n(self.b as f64)
        )
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

/// An embedded image and its resource name
struct PlacedImage {
    hash: u64,
    name: String,
    xobject: ImageXObject,
}

/// Drawing surface for one overlay page
pub struct Canvas {
    width: f64,
    height: f64,
    /// Buffered content operators
    content: Vec<u8>,
    /// Registered TrueType fonts (name -> font)
    truetype: HashMap<String, FontData>,
    /// Fonts used so far, in resource order (F1, F2, ...)
    font_resources: Vec<(FontRef, String)>,
    /// Images used so far, deduplicated by content hash
    images: Vec<PlacedImage>,
    /// Fill opacities used so far (alpha in 1/1000 -> resource name)
    alpha_states: Vec<(u32, String)>,
}

impl Canvas {
    /// Create an empty canvas of the given size in points
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            content: Vec::new(),
            truetype: HashMap::new(),
            font_resources: Vec::new(),
            images: Vec::new(),
            alpha_states: Vec::new(),
        }
    }

    /// Create an empty A4 portrait canvas
    pub fn a4() -> Self {
        Self::new(A4_WIDTH, A4_HEIGHT)
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// Buffered content operators
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// True when nothing has been drawn
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Register a TrueType font under a name templates can refer to
    ///
    /// # Arguments
    /// * `name` - Font name as used in coordinate files (e.g., "Poppins-Bold")
    /// * `ttf_data` - TrueType font file bytes
    pub fn register_truetype(&mut self, name: &str, ttf_data: &[u8]) -> Result<()> {
        let font = FontData::from_ttf(name, ttf_data)?;
        self.truetype.insert(name.to_string(), font);
        Ok(())
    }

    /// Pick the font used for a requested name
    ///
    /// Base-14 names win, then registered TrueType fonts; anything else is
    /// substituted with Helvetica or Helvetica-Bold.
    pub fn resolve_font(&self, name: &str) -> FontRef {
        if let Some(font) = StandardFont::from_name(name) {
            return FontRef::Standard(font);
        }
        if self.truetype.contains_key(name) {
            return FontRef::Embedded(name.to_string());
        }
        let substitute = StandardFont::substitute_for(name);
        log::debug!("font '{}' not available, using {}", name, substitute.base_name());
        FontRef::Standard(substitute)
    }

    /// Width of `text` in points with the font `name` resolves to
    pub fn text_width(&self, text: &str, font_name: &str, font_size: f32) -> f64 {
        match self.resolve_font(font_name) {
            FontRef::Standard(font) => font.text_width_points(text, font_size),
            FontRef::Embedded(key) => self
                .truetype
                .get(&key)
                .map(|f| f.text_width_points(text, font_size))
                .unwrap_or(0.0),
        }
    }

    fn get_or_create_font_ref(&mut self, font: &FontRef) -> String {
        if let Some((_, name)) = self.font_resources.iter().find(|(f, _)| f == font) {
            return name.clone();
        }
        let name = format!("F{}", self.font_resources.len() + 1);
        self.font_resources.push((font.clone(), name.clone()));
        name
    }

    /// Draw a single line of text
    ///
    /// # Arguments
    /// * `text` - Text to draw
    /// * `x` - Anchor X in points; its meaning depends on `align`
    /// * `y` - Baseline Y in points (from bottom)
    /// * `align` - Alignment relative to `x`
    /// * `font_name` - Requested font name
    /// * `font_size` - Font size in points
    /// * `color` - Fill color
    ///
    /// # Returns
    /// The text width in points
    #[allow(clippy::too_many_arguments)]
    pub fn draw_text(
        &mut self,
        text: &str,
        x: f64,
        y: f64,
        align: Align,
        font_name: &str,
        font_size: f32,
        color: Color,
    ) -> f64 {
        let font = self.resolve_font(font_name);
        let text_width = self.text_width(text, font_name, font_size);

        let encoded = match &font {
            FontRef::Standard(_) => encode_literal(&encode_win_ansi(text)),
            FontRef::Embedded(key) => match self.truetype.get_mut(key) {
                Some(data) => {
                    data.add_chars(text);
                    data.encode_text_hex(text)
                }
                None => encode_literal(&encode_win_ansi(text)),
            },
        };

        let ctx = TextRenderContext {
            font_name: self.get_or_create_font_ref(&font),
            font_size,
            text_width,
            color,
        };
        let ops = generate_text_operators(&encoded, x, y, align, &ctx);
        self.content.extend_from_slice(&ops);
        text_width
    }

    /// Fill an axis-aligned rectangle
    pub fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Color) {
        let ops = format!(
            "{}{} {} {} {} re\nf\n",
            color.fill_op(),
            n(x),
            n(y),
            n(width),
            n(height)
        );
        self.content.extend_from_slice(ops.as_bytes());
    }

    /// Stroke a straight line, optionally dashed as `(on, off)` lengths
    #[allow(clippy::too_many_arguments)]
    pub fn stroke_line(
        &mut self,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        line_width: f64,
        color: Color,
        dash: Option<(f64, f64)>,
    ) {
        let mut ops = String::from("q\n");
        ops.push_str(&color.stroke_op());
        ops.push_str(&format!("{} w\n", n(line_width)));
        if let Some((on, off)) = dash {
            ops.push_str(&format!("[{} {}] 0 d\n", n(on), n(off)));
        }
        ops.push_str(&format!(
            "{} {} m\n{} {} l\nS\nQ\n",
            n(x1),
            n(y1),
            n(x2),
            n(y2)
        ));
        self.content.extend_from_slice(ops.as_bytes());
    }

    /// Fill a closed polygon
    pub fn fill_polygon(&mut self, points: &[(f64, f64)], color: Color) {
        let Some(((x0, y0), rest)) = points.split_first() else {
            return;
        };
        let mut ops = color.fill_op();
        ops.push_str(&format!("{} {} m\n", n(*x0), n(*y0)));
        for (x, y) in rest {
            ops.push_str(&format!("{} {} l\n", n(*x), n(*y)));
        }
        ops.push_str("h\nf\n");
        self.content.extend_from_slice(ops.as_bytes());
    }

    /// Fill a circle
    pub fn fill_circle(&mut self, cx: f64, cy: f64, radius: f64, color: Color) {
        let mut ops = color.fill_op();
        ops.push_str(&format!("{} {} m\n", n(cx + radius), n(cy)));
        push_arc(&mut ops, cx, cy, radius, 0.0, 360.0);
        ops.push_str("h\nf\n");
        self.content.extend_from_slice(ops.as_bytes());
    }

    /// Fill a ring segment between two radii
    ///
    /// Angles are in degrees, counter-clockwise from the positive X axis; a
    /// negative `extent_deg` sweeps clockwise. An inner radius of 0 gives a
    /// pie wedge.
    #[allow(clippy::too_many_arguments)]
    pub fn fill_ring_segment(
        &mut self,
        cx: f64,
        cy: f64,
        outer_radius: f64,
        inner_radius: f64,
        start_deg: f64,
        extent_deg: f64,
        color: Color,
    ) {
        if extent_deg.abs() < 1e-9 || outer_radius <= 0.0 {
            return;
        }
        let extent = extent_deg.clamp(-360.0, 360.0);
        let start = start_deg.to_radians();
        let end = (start_deg + extent).to_radians();

        let mut ops = color.fill_op();
        ops.push_str(&format!(
            "{} {} m\n",
            n(cx + outer_radius * start.cos()),
            n(cy + outer_radius * start.sin())
        ));
        push_arc(&mut ops, cx, cy, outer_radius, start_deg, extent);

        if inner_radius > 0.0 {
            ops.push_str(&format!(
                "{} {} l\n",
                n(cx + inner_radius * end.cos()),
                n(cy + inner_radius * end.sin())
            ));
            push_arc(&mut ops, cx, cy, inner_radius, start_deg + extent, -extent);
        } else {
            ops.push_str(&format!("{} {} l\n", n(cx), n(cy)));
        }
        ops.push_str("h\nf\n");
        self.content.extend_from_slice(ops.as_bytes());
    }

    /// Draw a JPEG or PNG image with its bottom-left corner at (x, y)
    ///
    /// # Returns
    /// The drawn (width, height) in points
    pub fn draw_image(
        &mut self,
        data: &[u8],
        x: f64,
        y: f64,
        box_width: f64,
        box_height: f64,
        mode: ImageScaleMode,
    ) -> Result<(f64, f64)> {
        let mut hasher = DefaultHasher::new();
        data.hash(&mut hasher);
        let hash = hasher.finish();

        let index = match self.images.iter().position(|img| img.hash == hash) {
            Some(index) => index,
            None => {
                let xobject = ImageXObject::from_bytes(data)?;
                let name = format!("Im{}", self.images.len() + 1);
                self.images.push(PlacedImage {
                    hash,
                    name,
                    xobject,
                });
                self.images.len() - 1
            }
        };

        let placed = &self.images[index];
        let (w, h) = calculate_scaled_dimensions(
            placed.xobject.width,
            placed.xobject.height,
            box_width,
            box_height,
            mode,
        );
        if w <= 0.0 || h <= 0.0 {
            return Err(PdfError::ImageError(format!(
                "image does not fit a {box_width}x{box_height} box"
            )));
        }
        let ops = generate_image_operators(&placed.name, x, y, w, h);
        self.content.extend_from_slice(&ops);
        Ok((w, h))
    }

    /// Push the graphics state (`q`)
    pub fn save_state(&mut self) {
        self.content.extend_from_slice(b"q\n");
    }

    /// Pop the graphics state (`Q`)
    pub fn restore_state(&mut self) {
        self.content.extend_from_slice(b"Q\n");
    }

    /// Move the origin
    pub fn translate(&mut self, tx: f64, ty: f64) {
        let ops = format!("1 0 0 1 {} {} cm\n", n(tx), n(ty));
        self.content.extend_from_slice(ops.as_bytes());
    }

    /// Rotate counter-clockwise around the current origin
    pub fn rotate(&mut self, degrees: f64) {
        let (sin, cos) = degrees.to_radians().sin_cos();
        let ops = format!("{} {} {} {} 0 0 cm\n", n(cos), n(sin), n(-sin), n(cos));
        self.content.extend_from_slice(ops.as_bytes());
    }

    /// Set fill and stroke opacity for subsequent drawing
    pub fn set_alpha(&mut self, alpha: f64) {
        let key = (alpha.clamp(0.0, 1.0) * 1000.0).round() as u32;
        let name = match self.alpha_states.iter().find(|(k, _)| *k == key) {
            Some((_, name)) => name.clone(),
            None => {
                let name = format!("GS{}", self.alpha_states.len() + 1);
                self.alpha_states.push((key, name.clone()));
                name
            }
        };
        let ops = format!("/{name} gs\n");
        self.content.extend_from_slice(ops.as_bytes());
    }

    /// Write the canvas as a one-page PDF
    pub fn finish(self) -> Result<Vec<u8>> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut fonts = Dictionary::new();
        for (font, name) in &self.font_resources {
            let font_id = match font {
                FontRef::Standard(standard) => doc.add_object(standard.to_pdf_dictionary()),
                FontRef::Embedded(key) => self
                    .truetype
                    .get(key)
                    .ok_or_else(|| PdfError::FontNotFound(key.clone()))?
                    .embed(&mut doc)?,
            };
            fonts.set(name.as_str(), Object::Reference(font_id));
        }

        let mut xobjects = Dictionary::new();
        for image in &self.images {
            let image_id = image.xobject.embed(&mut doc);
            xobjects.set(image.name.as_str(), Object::Reference(image_id));
        }

        let mut gstates = Dictionary::new();
        for (key, name) in &self.alpha_states {
            let alpha = *key as f32 / 1000.0;
            let mut gs = Dictionary::new();
            gs.set("Type", Object::Name(b"ExtGState".to_vec()));
            gs.set("ca", Object::Real(alpha));
            gs.set("CA", Object::Real(alpha));
            gstates.set(name.as_str(), Object::Dictionary(gs));
        }

        let mut resources = Dictionary::new();
        if !fonts.is_empty() {
            resources.set("Font", Object::Dictionary(fonts));
        }
        if !xobjects.is_empty() {
            resources.set("XObject", Object::Dictionary(xobjects));
        }
        if !gstates.is_empty() {
            resources.set("ExtGState", Object::Dictionary(gstates));
        }

        let content_id = doc.add_object(Stream::new(Dictionary::new(), self.content));

        let mut page = Dictionary::new();
        page.set("Type", Object::Name(b"Page".to_vec()));
        page.set("Parent", Object::Reference(pages_id));
        page.set(
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(self.width as f32),
                Object::Real(self.height as f32),
            ]),
        );
        page.set("Resources", Object::Dictionary(resources));
        page.set("Contents", Object::Reference(content_id));
        let page_id = doc.add_object(page);

        let mut pages = Dictionary::new();
        pages.set("Type", Object::Name(b"Pages".to_vec()));
        pages.set("Kids", Object::Array(vec![Object::Reference(page_id)]));
        pages.set("Count", Object::Integer(1));
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(pages_id));
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut out = Vec::new();
        doc.save_to(&mut out)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;
        Ok(out)
    }
}

/// Append cubic Bezier segments approximating a circular arc
///
/// The current point must already be at the arc start.
fn push_arc(ops: &mut String, cx: f64, cy: f64, r: f64, start_deg: f64, extent_deg: f64) {
    let segments = (extent_deg.abs() / 90.0).ceil().max(1.0) as usize;
    let step = (extent_deg / segments as f64).to_radians();
    let k = 4.0 / 3.0 * (step / 4.0).tan();

    let mut a = start_deg.to_radians();
    for _ in 0..segments {
        let b = a + step;
        let (sa, ca) = a.sin_cos();
        let (sb, cb) = b.sin_cos();
        ops.push_str(&format!(
            "{} {} {} {} {} {} c\n",
            n(cx + r * (ca - k * sa)),
            n(cy + r * (sa + k * ca)),
            n(cx + r * (cb + k * sb)),
            n(cy + r * (sb - k * cb)),
            n(cx + r * cb),
            n(cy + r * sb)
        ));
        a = b;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn content_str(canvas: &Canvas) -> String {
        String::from_utf8_lossy(canvas.content()).into_owned()
    }

    #[test]
    fn test_color_from_hex() {
        assert_eq!(Color::from_hex(0xFF0000), Color::rgb(1.0, 0.0, 0.0));
        assert_eq!(Color::from_hex(0x000000), Color::black());
    }

    #[test]
    fn test_draw_text_standard_font() {
        let mut canvas = Canvas::a4();
        let width = canvas.draw_text(
            "Max Mustermann",
            100.0,
            700.0,
            Align::Left,
            "Helvetica",
            10.0,
            Color::black(),
        );

        assert!(width > 0.0);
        let ops = content_str(&canvas);
        assert!(ops.contains("/F1 10 Tf"));
        assert!(ops.contains("100 700 Td"));
        assert!(ops.contains("(Max Mustermann) Tj"));
    }

    #[test]
    fn test_unknown_font_substituted() {
        let canvas = Canvas::a4();
        assert_eq!(
            canvas.resolve_font("Poppins-Bold"),
            FontRef::Standard(StandardFont::HelveticaBold)
        );
        assert_eq!(
            canvas.resolve_font("Poppins-Regular"),
            FontRef::Standard(StandardFont::Helvetica)
        );
    }

    #[test]
    fn test_font_resources_reused() {
        let mut canvas = Canvas::a4();
        canvas.draw_text("a", 0.0, 0.0, Align::Left, "Helvetica", 10.0, Color::black());
        canvas.draw_text("b", 0.0, 0.0, Align::Left, "Helvetica-Bold", 10.0, Color::black());
        canvas.draw_text("c", 0.0, 0.0, Align::Left, "ArialMT", 10.0, Color::black());

        let ops = content_str(&canvas);
        assert!(ops.contains("/F1 10 Tf"));
        assert!(ops.contains("/F2 10 Tf"));
        assert!(!ops.contains("/F3"));
    }

    #[test]
    fn test_right_aligned_text() {
        let mut canvas = Canvas::a4();
        // "0" is 556 units wide in Helvetica
        canvas.draw_text("0", 100.0, 50.0, Align::Right, "Helvetica", 10.0, Color::black());
        assert!(content_str(&canvas).contains("94.44 50 Td"));
    }

    #[test]
    fn test_fill_rect_operators() {
        let mut canvas = Canvas::a4();
        canvas.fill_rect(10.0, 20.0, 30.0, 40.0, Color::white());
        assert_eq!(content_str(&canvas), "1 1 1 rg\n10 20 30 40 re\nf\n");
    }

    #[test]
    fn test_ring_segment_closes_path() {
        let mut canvas = Canvas::a4();
        canvas.fill_ring_segment(100.0, 100.0, 50.0, 30.0, 90.0, -180.0, Color::black());
        let ops = content_str(&canvas);
        assert!(ops.starts_with("0 0 0 rg\n100 150 m\n"));
        // two quarter arcs outside, two inside
        assert_eq!(ops.matches(" c\n").count(), 4);
        assert!(ops.ends_with("h\nf\n"));
    }

    #[test]
    fn test_zero_extent_segment_skipped() {
        let mut canvas = Canvas::a4();
        canvas.fill_ring_segment(0.0, 0.0, 10.0, 5.0, 0.0, 0.0, Color::black());
        assert!(canvas.is_empty());
    }

    #[test]
    fn test_alpha_states_deduplicated() {
        let mut canvas = Canvas::a4();
        canvas.set_alpha(0.15);
        canvas.set_alpha(0.15);
        canvas.set_alpha(1.0);
        let ops = content_str(&canvas);
        assert_eq!(ops.matches("/GS1 gs").count(), 2);
        assert!(ops.contains("/GS2 gs"));
    }

    #[test]
    fn test_finish_produces_single_page_pdf() {
        let mut canvas = Canvas::a4();
        canvas.set_alpha(0.5);
        canvas.draw_text("Angebot", 50.0, 50.0, Align::Center, "Helvetica-Bold", 12.0, Color::black());

        let bytes = canvas.finish().unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let doc = Document::load_mem(&bytes).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 1);

        let page_id = *pages.get(&1).unwrap();
        let content = doc.get_page_content(page_id).unwrap();
        assert!(String::from_utf8_lossy(&content).contains("(Angebot) Tj"));
    }

    #[test]
    fn test_invalid_image_rejected() {
        let mut canvas = Canvas::a4();
        let result = canvas.draw_image(b"not an image", 0.0, 0.0, 10.0, 10.0, ImageScaleMode::FitBox);
        assert!(result.is_err());
        assert!(canvas.is_empty());
    }
}
