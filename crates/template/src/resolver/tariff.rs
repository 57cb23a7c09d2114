//! Feed-in tariff lookup

use super::{first_number, first_text, DynamicData, GenerationRequest};
use crate::settings::Settings;

/// Tariff used when neither a band nor the results supply one, in €/kWh
pub const DEFAULT_FEED_IN_TARIFF: f64 = 0.0786;

/// Partial or full grid feed-in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedInMode {
    #[default]
    Parts,
    Full,
}

impl FeedInMode {
    /// Parse a loosely written mode; anything unknown is `Parts`
    pub fn parse(text: &str) -> Self {
        match text.trim().to_lowercase().as_str() {
            "full" => FeedInMode::Full,
            _ => FeedInMode::Parts,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FeedInMode::Parts => "parts",
            FeedInMode::Full => "full",
        }
    }
}

/// Values above 1 are cents
fn to_euro(value: f64) -> f64 {
    if value > 1.0 {
        value / 100.0
    } else {
        value
    }
}

/// Feed-in tariff in €/kWh for a system size
///
/// # Arguments
/// * `kwp` - System size in kWp
/// * `mode` - Partial or full feed-in
/// * `settings` - Supplies the tariff bands
/// * `results_value` - Tariff reported by the analysis, used when no band matches
pub fn resolve_feed_in_tariff(
    kwp: f64,
    mode: FeedInMode,
    settings: &Settings,
    results_value: Option<f64>,
) -> f64 {
    let band = settings
        .feed_in_tariffs
        .bands(mode.as_str())
        .into_iter()
        .find(|band| band.contains(kwp));

    if let Some(band) = band {
        return to_euro(band.ct_per_kwh);
    }

    match results_value.map(to_euro) {
        Some(value) if value > 0.0 => value,
        _ => {
            log::debug!("no tariff band for {kwp} kWp, using default");
            DEFAULT_FEED_IN_TARIFF
        }
    }
}

/// `7,86 Cent / kWh`
fn tariff_text(euro_per_kwh: f64) -> String {
    format!("{:.2} Cent / kWh", euro_per_kwh * 100.0).replace('.', ",")
}

pub(super) fn resolve(
    data: &mut DynamicData,
    request: &GenerationRequest,
    settings: &Settings,
    kwp: f64,
) -> f64 {
    let mode = first_text(&request.project, &["einspeise_art"])
        .map(|text| FeedInMode::parse(&text))
        .unwrap_or_default();
    let results_value = first_number(&request.results, &["einspeiseverguetung_eur_per_kwh"]);

    let tariff = resolve_feed_in_tariff(kwp, mode, settings, results_value);
    data.insert("feed_in_tariff_text", tariff_text(tariff));
    tariff
}
