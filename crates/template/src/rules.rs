//! Per-page overlay rules
//!
//! Every page runs the same element loop. Page-specific behaviour (KPI
//! donuts, the cost chart, masking stale sample values) is attached as
//! [`PageRule`]s in a [`RuleRegistry`], so a new page layout only needs new
//! registrations.
//!
//! A rule can hook in at three points:
//! - before the element loop (backdrops, charts, images)
//! - per element, where it may re-anchor, suppress or mask the element
//! - after the element loop (overpainting)

use crate::blocks::bar_chart::{self, AxisBand};
use crate::blocks::donut::{self, Donut};
use crate::blocks::{self, images, watermark};
use crate::coords::{DrawElement, DEFAULT_FONT, DEFAULT_FONT_SIZE};
use crate::renderer::{PageContext, ResolvedElement};
use lazy_static::lazy_static;
use offer_format::{parse_float, parse_money};
use pdf_core::{Align, Color};
use regex::Regex;
use std::collections::BTreeMap;

/// Page-1 sample literals anchored at their right edge
pub const PAGE1_RIGHT_ALIGNED: &[&str] = &["36.958,00 EUR*", "8.251,92 kWh/Jahr", "29.150,00 EUR*"];

/// Page-3 sample literals anchored at their right edge
pub const PAGE3_RIGHT_ALIGNED: &[&str] = &[
    "NOSW",
    "Deckung",
    "Verbrauch 32 Cent",
    "Kredit",
    "Neigung",
    "Art",
    "EEG",
    "Direkt",
    "Einspeisung",
    "Speichernutzung",
    "Überschuss",
    "Gesamt",
];

/// Page-1 keys shown by the donuts instead of as text
pub const DONUT_KEYS: &[&str] = &["self_supply_rate_percent", "self_consumption_percent"];

/// Page-3 sample totals that are blanked and redrawn after the loop
pub const OVERPAINT_LITERALS: &[&str] = &["46.296,00 €", "58.230,61 €"];

const DONUT_CY: f64 = 440.0;
const OVERPAINT_FONT: &str = "Helvetica-Bold";
const OVERPAINT_SIZE: f32 = 10.49;

/// Product images on page 4: data key and top edge below the page top
const PRODUCT_IMAGES: [(&str, f64); 3] = [
    ("module_image_b64", 250.0),
    ("inverter_image_b64", 440.0),
    ("storage_image_b64", 630.0),
];

lazy_static! {
    static ref AXIS_LABEL_RE: Regex = Regex::new(r"^\d{1,3}(\.\d{3})*$").unwrap();
}

/// How the element loop should treat one element
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// Alignment class of the element loop
    Default,
    /// Do not draw the element
    Skip,
    /// Draw the resolved text anchored at an x position
    Anchored(Align, f64),
}

/// One behaviour attached to a page
#[derive(Debug, Clone, PartialEq)]
pub enum PageRule {
    /// Tiled diagonal watermark, when enabled in the settings
    Watermark,
    /// Installer logo over the artwork's logo area
    CompanyLogo,
    /// Blue triangle in the top-right corner
    CornerTriangle,
    /// White footer digits become `Seite i von N`
    FooterPageNumber,
    /// Self-supply and self-consumption ring gauges
    DonutGauges,
    /// Right-align these literals at x1 plus an offset
    RightAlignLiterals {
        literals: &'static [&'static str],
        offset: f64,
    },
    /// Never draw these keys as text
    SuppressKeys(&'static [&'static str]),
    /// White panel behind the cost chart
    ChartBackdrop,
    /// Electricity cost bar chart
    CostBarChart,
    /// White box under the simulation banner text; stray currency labels dropped
    Masking,
    /// Thin line under the battery savings line
    SavingsSeparator,
    /// Redraw the cost totals over their sample values
    CostOverpaint,
    /// Module, inverter and storage pictures
    ProductImages,
}

impl PageRule {
    pub(crate) fn before(&self, ctx: &mut PageContext<'_>) {
        match self {
            PageRule::Watermark => watermark::draw_watermark(&mut ctx.canvas, &ctx.settings.watermark),
            PageRule::CompanyLogo => {
                if let Some(logo) = ctx.data.get("company_logo_b64").filter(|s| !s.trim().is_empty()) {
                    if let Err(e) = blocks::draw_company_logo(&mut ctx.canvas, logo) {
                        log::warn!("company logo skipped: {e}");
                    }
                }
            }
            PageRule::CornerTriangle => blocks::draw_corner_triangle(&mut ctx.canvas),
            PageRule::DonutGauges => draw_donuts(ctx),
            PageRule::ChartBackdrop => {
                let h = ctx.canvas.height();
                ctx.canvas.fill_rect(350.0, h - 400.0, 260.0, 250.0, Color::white());
            }
            PageRule::CostBarChart => {
                let values = [
                    money(ctx, "cost_20y_no_increase_number"),
                    money(ctx, "cost_20y_with_increase_number"),
                ];
                let band = axis_band(ctx.elements);
                let legend = legend_labels(ctx.elements);
                bar_chart::draw_cost_chart(&mut ctx.canvas, band, values, &legend);
            }
            PageRule::ProductImages => {
                let h = ctx.canvas.height();
                for (key, offset) in PRODUCT_IMAGES {
                    let Some(payload) = ctx.data.get(key).filter(|s| !s.trim().is_empty()) else {
                        continue;
                    };
                    if let Err(e) = images::draw_hanging(&mut ctx.canvas, payload, 50.0, h - offset, 140.0, 90.0) {
                        log::warn!("{key} skipped: {e}");
                    }
                }
            }
            _ => {}
        }
    }

    pub(crate) fn on_element(&self, ctx: &mut PageContext<'_>, el: &ResolvedElement<'_>) -> Placement {
        let element = el.element;
        match self {
            PageRule::FooterPageNumber if is_footer_number(el, ctx.page_index) => {
                let text = format!("Seite {} von {}", ctx.page_index, ctx.total_pages);
                ctx.draw_text(element, &text, element.rect.x1, Align::Right);
                Placement::Skip
            }
            PageRule::RightAlignLiterals { literals, offset } if literals.contains(&element.text.trim()) => {
                Placement::Anchored(Align::Right, element.rect.x1 + offset)
            }
            PageRule::SuppressKeys(keys) if el.key.is_some_and(|k| keys.contains(&k)) => Placement::Skip,
            PageRule::Masking => {
                let text = element.text.trim();
                if text.contains("JAHRE SIMULATION") {
                    let h = ctx.canvas.height();
                    let r = element.rect;
                    ctx.canvas
                        .fill_rect(r.x0 - 2.0, h - r.y1 - 2.0, r.width() + 4.0, r.height() + 4.0, Color::white());
                    Placement::Default
                } else if text == "EUR" && element.rect.x0 >= 100.0 {
                    Placement::Skip
                } else {
                    Placement::Default
                }
            }
            PageRule::SavingsSeparator if el.key == Some("battery_usage_savings_eur") => {
                let y = element.rect.canvas_y(ctx.canvas.height()) - 15.0;
                let r = element.rect;
                ctx.canvas.stroke_line(r.x0, y, r.x1, y, 0.5, Color::gray(0.7), None);
                Placement::Default
            }
            PageRule::CostOverpaint if OVERPAINT_LITERALS.contains(&element.text.trim()) => Placement::Skip,
            _ => Placement::Default,
        }
    }

    pub(crate) fn after(&self, ctx: &mut PageContext<'_>) {
        if let PageRule::CostOverpaint = self {
            overpaint_costs(ctx);
        }
    }
}

fn is_footer_number(el: &ResolvedElement<'_>, page_index: usize) -> bool {
    let element = el.element;
    let text = element.text.trim();
    el.key.is_none()
        && !text.is_empty()
        && text.chars().all(|c| c.is_ascii_digit())
        && text.parse::<usize>().ok() == Some(page_index)
        && element.rect.y1 >= 780.0
        && element.rect.x0 >= 520.0
        && element.color & 0xFF_FFFF == 0xFF_FFFF
}

fn money(ctx: &PageContext<'_>, key: &str) -> f64 {
    ctx.data.get(key).map(parse_money).unwrap_or(0.0)
}

fn percent_of(ctx: &PageContext<'_>, keys: &[&str]) -> Option<(f64, String)> {
    keys.iter()
        .filter_map(|key| ctx.data.get(key))
        .find_map(|text| parse_float(text).map(|pct| (pct, text.trim().to_string())))
}

fn draw_donuts(ctx: &mut PageContext<'_>) {
    let gauges = [
        (95.0, &["self_supply_rate_percent", "self_sufficiency_percent", "autarky_percent"][..]),
        (210.0, &["self_consumption_percent", "direct_cover_consumption_percent_number"][..]),
    ];
    for (cx, keys) in gauges {
        if let Some((pct, label)) = percent_of(ctx, keys) {
            let label = if label.ends_with('%') { label } else { String::new() };
            donut::draw_donut(&mut ctx.canvas, &Donut::new(cx, DONUT_CY, pct, label));
        }
    }
}

/// Axis band from the printed labels `25.000` (top) and `0` (bottom)
///
/// Falls back to the spread of numeric labels left of x 100, then to the
/// fixed default band.
pub(crate) fn axis_band(elements: &[DrawElement]) -> AxisBand {
    let y1_of = |text: &str| elements.iter().find(|e| e.text.trim() == text).map(|e| e.rect.y1);
    if let (Some(top), Some(bottom)) = (y1_of("25.000"), y1_of("0")) {
        if top < bottom {
            return AxisBand { top, bottom };
        }
    }

    let ys: Vec<f64> = elements
        .iter()
        .filter(|e| e.rect.x0 < 100.0 && AXIS_LABEL_RE.is_match(e.text.trim()))
        .map(|e| e.rect.y1)
        .collect();
    let top = ys.iter().copied().fold(f64::INFINITY, f64::min);
    let bottom = ys.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if ys.len() >= 2 && bottom > top {
        AxisBand { top, bottom }
    } else {
        AxisBand::default()
    }
}

/// Legend texts: labels right of x 300 that mention the electricity price
pub(crate) fn legend_labels(elements: &[DrawElement]) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    for element in elements.iter().filter(|e| e.rect.x0 >= 300.0) {
        let text = element.text.trim();
        if text.to_lowercase().contains("strompreis") && !labels.iter().any(|l| l == text) {
            labels.push(text.to_string());
        }
    }
    labels
}

fn overpaint_costs(ctx: &mut PageContext<'_>) {
    let elements = ctx.elements;
    let h = ctx.canvas.height();
    for element in elements.iter().filter(|e| OVERPAINT_LITERALS.contains(&e.text.trim())) {
        let Some(value) = ResolvedElement::resolve(element, ctx.data).value() else {
            continue;
        };
        let font = if element.font_name == DEFAULT_FONT {
            OVERPAINT_FONT
        } else {
            element.font_name.as_str()
        };
        let size = if element.font_size == DEFAULT_FONT_SIZE {
            OVERPAINT_SIZE
        } else {
            element.font_size
        };

        let r = element.rect;
        let y = h - r.y1;
        ctx.canvas
            .fill_rect(r.x0 - 2.0, y - 1.5, r.width() + 4.0, size as f64 + 3.0, Color::white());
        ctx.canvas.draw_text(&value, r.x0, y, Align::Left, font, size, Color::black());
    }
}

/// Page rules keyed by 1-based page index
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    common: Vec<PageRule>,
    pages: BTreeMap<usize, Vec<PageRule>>,
}

impl RuleRegistry {
    /// An empty registry: pages render with the plain element loop
    pub fn new() -> Self {
        Self::default()
    }

    /// Rules of the seven-page offer template
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for rule in [
            PageRule::Watermark,
            PageRule::CompanyLogo,
            PageRule::CornerTriangle,
            PageRule::FooterPageNumber,
        ] {
            registry.register_common(rule);
        }

        registry.register(1, PageRule::DonutGauges);
        registry.register(
            1,
            PageRule::RightAlignLiterals {
                literals: PAGE1_RIGHT_ALIGNED,
                offset: 17.0,
            },
        );
        registry.register(1, PageRule::SuppressKeys(DONUT_KEYS));

        registry.register(3, PageRule::ChartBackdrop);
        registry.register(3, PageRule::CostBarChart);
        registry.register(3, PageRule::Masking);
        registry.register(
            3,
            PageRule::RightAlignLiterals {
                literals: PAGE3_RIGHT_ALIGNED,
                offset: 0.0,
            },
        );
        registry.register(3, PageRule::SavingsSeparator);
        registry.register(3, PageRule::CostOverpaint);

        registry.register(4, PageRule::ProductImages);
        registry
    }

    /// Add a rule that runs on every page, before page rules
    pub fn register_common(&mut self, rule: PageRule) {
        self.common.push(rule);
    }

    pub fn register(&mut self, page_index: usize, rule: PageRule) {
        self.pages.entry(page_index).or_default().push(rule);
    }

    /// Common rules followed by the page's own rules, in registration order
    pub fn rules_for(&self, page_index: usize) -> Vec<&PageRule> {
        self.common
            .iter()
            .chain(self.pages.get(&page_index).into_iter().flatten())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Rect;
    use pretty_assertions::assert_eq;

    fn element(text: &str, x0: f64, y1: f64) -> DrawElement {
        DrawElement {
            text: text.to_string(),
            rect: Rect::new(x0, y1 - 10.0, x0 + 40.0, y1),
            font_name: DEFAULT_FONT.to_string(),
            font_size: DEFAULT_FONT_SIZE,
            color: 0,
        }
    }

    #[test]
    fn test_standard_registry() {
        let registry = RuleRegistry::standard();
        assert_eq!(registry.rules_for(2).len(), 4);
        assert_eq!(registry.rules_for(2)[0], &PageRule::Watermark);

        let page1 = registry.rules_for(1);
        assert_eq!(page1.len(), 7);
        assert_eq!(page1[4], &PageRule::DonutGauges);

        let page3 = registry.rules_for(3);
        assert_eq!(page3[4], &PageRule::ChartBackdrop);
        assert_eq!(page3.last(), Some(&&PageRule::CostOverpaint));

        assert!(registry.rules_for(4).contains(&&PageRule::ProductImages));
        assert!(RuleRegistry::new().rules_for(1).is_empty());
    }

    #[test]
    fn test_register_new_page() {
        let mut registry = RuleRegistry::new();
        registry.register(6, PageRule::ProductImages);
        assert_eq!(registry.rules_for(6), vec![&PageRule::ProductImages]);
        assert!(registry.rules_for(5).is_empty());
    }

    #[test]
    fn test_axis_band_from_labels() {
        let elements = vec![element("25.000", 60.0, 190.0), element("0", 70.0, 330.0)];
        assert_eq!(axis_band(&elements), AxisBand { top: 190.0, bottom: 330.0 });
    }

    #[test]
    fn test_axis_label_pattern() {
        assert!(AXIS_LABEL_RE.is_match("25.000"));
        assert!(AXIS_LABEL_RE.is_match("0"));
        assert!(!AXIS_LABEL_RE.is_match("25.00"));
        assert!(!AXIS_LABEL_RE.is_match("46.296,00 €"));
    }

    #[test]
    fn test_axis_band_fallbacks() {
        let elements = vec![
            element("100.000", 60.0, 200.0),
            element("50.000", 60.0, 260.0),
            element("0", 70.0, 320.0),
            element("999", 400.0, 500.0),
        ];
        assert_eq!(axis_band(&elements), AxisBand { top: 200.0, bottom: 320.0 });
        assert_eq!(axis_band(&[]), AxisBand::default());
    }

    #[test]
    fn test_legend_labels() {
        let elements = vec![
            element("Strompreis ohne Steigerung", 360.0, 500.0),
            element("Strompreis ohne Steigerung", 360.0, 520.0),
            element("mit STROMPREIS-Steigerung", 360.0, 540.0),
            element("Strompreis", 60.0, 540.0),
        ];
        assert_eq!(
            legend_labels(&elements),
            vec!["Strompreis ohne Steigerung".to_string(), "mit STROMPREIS-Steigerung".to_string()]
        );
    }
}
