//! Overlay rendering
//!
//! Draws one page's coordinate elements, with their resolved values, onto a
//! transparent one-page PDF the compositor later stamps over the template
//! background.

use crate::blocks::images;
use crate::coords::DrawElement;
use crate::resolver::DynamicData;
use crate::rules::{Placement, RuleRegistry};
use crate::settings::Settings;
use crate::token::Token;
use crate::Result;
use pdf_core::{Align, Canvas, A4_HEIGHT, A4_WIDTH};
use std::path::Path;

/// Keys centred between x0 and x1
pub const CENTER_KEYS: &[&str] = &[
    "direct_consumption_quote_prod_percent",
    "battery_use_quote_prod_percent",
    "feed_in_quote_prod_percent_number",
    "direct_cover_consumption_percent_number",
    "battery_cover_consumption_percent",
    "grid_consumption_rate_percent",
];

/// A TrueType font usable by name in coordinate files
#[derive(Debug, Clone, PartialEq)]
pub struct FontFile {
    pub name: String,
    pub data: Vec<u8>,
}

/// Load every `.ttf` in a directory, named after its file stem
pub fn load_font_dir(dir: impl AsRef<Path>) -> Result<Vec<FontFile>> {
    let mut fonts = Vec::new();
    for entry in std::fs::read_dir(dir.as_ref())? {
        let path = entry?.path();
        let is_ttf = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("ttf"));
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if !is_ttf {
            continue;
        }
        fonts.push(FontFile {
            name: name.to_string(),
            data: std::fs::read(&path)?,
        });
    }
    fonts.sort_by(|a, b| a.name.cmp(&b.name));
    log::debug!("loaded {} fonts from {}", fonts.len(), dir.as_ref().display());
    Ok(fonts)
}

/// An element with its token resolved against the page data
pub(crate) struct ResolvedElement<'a> {
    pub element: &'a DrawElement,
    /// Data key the placeholder maps to
    pub key: Option<&'a str>,
    /// Text to draw: the data value, or the literal when unmapped
    pub text: String,
}

impl<'a> ResolvedElement<'a> {
    pub fn resolve(element: &'a DrawElement, data: &DynamicData) -> Self {
        let key = Token::parse(&element.text).key();
        let text = match key {
            Some(key) => data.get(key).unwrap_or_default().to_string(),
            None => element.text.clone(),
        };
        Self { element, key, text }
    }

    /// Mapped, non-empty data value
    pub fn value(&self) -> Option<String> {
        self.key.filter(|_| !self.text.trim().is_empty()).map(|_| self.text.clone())
    }
}

/// Drawing state of one page, shared with the page rules
pub(crate) struct PageContext<'a> {
    pub canvas: Canvas,
    /// 1-based
    pub page_index: usize,
    pub total_pages: usize,
    pub elements: &'a [DrawElement],
    pub data: &'a DynamicData,
    pub settings: &'a Settings,
}

impl PageContext<'_> {
    /// Draw text in the element's font, size and colour on its baseline
    pub fn draw_text(&mut self, element: &DrawElement, text: &str, x: f64, align: Align) {
        let y = element.rect.canvas_y(self.canvas.height());
        self.canvas
            .draw_text(text, x, y, align, &element.font_name, element.font_size, element.color());
    }
}

/// Renders overlay pages
pub struct OverlayRenderer {
    rules: RuleRegistry,
    fonts: Vec<FontFile>,
}

impl Default for OverlayRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlayRenderer {
    /// Renderer with the standard page rules and no extra fonts
    pub fn new() -> Self {
        Self {
            rules: RuleRegistry::standard(),
            fonts: Vec::new(),
        }
    }

    pub fn with_rules(mut self, rules: RuleRegistry) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_fonts(mut self, fonts: Vec<FontFile>) -> Self {
        self.fonts = fonts;
        self
    }

    /// Render one overlay page
    ///
    /// # Arguments
    /// * `page_index` - 1-based page number, selects the page rules
    /// * `elements` - Coordinate elements of the page
    /// * `data` - Resolved display values
    /// * `settings` - Settings snapshot
    /// * `total_pages` - Page count for footers
    /// * `page_size` - Background size; A4 when `None`
    ///
    /// # Returns
    /// A one-page PDF
    pub fn render_page(
        &self,
        page_index: usize,
        elements: &[DrawElement],
        data: &DynamicData,
        settings: &Settings,
        total_pages: usize,
        page_size: Option<(f64, f64)>,
    ) -> Result<Vec<u8>> {
        let canvas = self.render_canvas(page_index, elements, data, settings, total_pages, page_size);
        Ok(canvas.finish()?)
    }

    pub(crate) fn render_canvas(
        &self,
        page_index: usize,
        elements: &[DrawElement],
        data: &DynamicData,
        settings: &Settings,
        total_pages: usize,
        page_size: Option<(f64, f64)>,
    ) -> Canvas {
        let (width, height) = page_size.unwrap_or((A4_WIDTH, A4_HEIGHT));
        let mut canvas = Canvas::new(width, height);
        for font in &self.fonts {
            if let Err(e) = canvas.register_truetype(&font.name, &font.data) {
                log::warn!("font {} skipped: {e}", font.name);
            }
        }

        let mut ctx = PageContext {
            canvas,
            page_index,
            total_pages,
            elements,
            data,
            settings,
        };
        let rules = self.rules.rules_for(page_index);

        for rule in &rules {
            rule.before(&mut ctx);
        }

        for element in elements {
            let resolved = ResolvedElement::resolve(element, data);
            let mut placement = Placement::Default;
            for rule in &rules {
                let decision = rule.on_element(&mut ctx, &resolved);
                if placement == Placement::Default {
                    placement = decision;
                }
            }
            draw_element(&mut ctx, &resolved, placement);
        }

        for rule in &rules {
            rule.after(&mut ctx);
        }

        log::debug!("page {page_index}: {} elements, {} rules", elements.len(), rules.len());
        ctx.canvas
    }
}

fn draw_element(ctx: &mut PageContext<'_>, resolved: &ResolvedElement<'_>, placement: Placement) {
    let element = resolved.element;
    if resolved.text.trim().is_empty() {
        return;
    }

    match placement {
        Placement::Skip => {}
        Placement::Anchored(align, x) => ctx.draw_text(element, &resolved.text, x, align),
        Placement::Default => {
            let key = resolved.key.unwrap_or_default();
            let rect = element.rect;
            if key.ends_with("_b64") {
                let y = rect.canvas_y(ctx.canvas.height());
                if let Err(e) =
                    images::draw_fitted(&mut ctx.canvas, &resolved.text, rect.x0, y, rect.width(), rect.height())
                {
                    log::warn!("image for '{}' skipped: {e}", element.text);
                }
            } else if CENTER_KEYS.contains(&key) {
                ctx.draw_text(element, &resolved.text, (rect.x0 + rect.x1) / 2.0, Align::Center);
            } else {
                ctx.draw_text(element, &resolved.text, rect.x0, Align::Left);
            }
        }
    }
}
