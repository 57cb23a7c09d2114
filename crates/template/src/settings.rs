//! Read-only generation settings
//!
//! One snapshot is loaded per request and shared by the resolver and the
//! renderer. Every field is optional in the JSON file.

use crate::Result;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Default electricity price increase in percent per year
pub const DEFAULT_PRICE_INCREASE_PERCENT: f64 = 5.0;

/// Settings snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub feed_in_tariffs: FeedInTariffs,
    pub watermark: WatermarkSettings,
    pub electricity_price_increase_annual_percent: f64,
    /// Overrides the computed page count in footers
    pub total_pages: Option<usize>,
    /// Directory of `.ttf` files usable by name in coordinate files
    pub font_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            feed_in_tariffs: FeedInTariffs::default(),
            watermark: WatermarkSettings::default(),
            electricity_price_increase_annual_percent: DEFAULT_PRICE_INCREASE_PERCENT,
            total_pages: None,
            font_dir: None,
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

/// One feed-in tariff band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TariffBand {
    #[serde(default)]
    pub kwp_min: f64,
    #[serde(default = "unbounded")]
    pub kwp_max: f64,
    /// Cents per kWh; values up to 1 are read as €/kWh
    pub ct_per_kwh: f64,
}

fn unbounded() -> f64 {
    999_999.0
}

impl TariffBand {
    pub fn new(kwp_min: f64, kwp_max: f64, ct_per_kwh: f64) -> Self {
        Self {
            kwp_min,
            kwp_max,
            ct_per_kwh,
        }
    }

    pub fn contains(&self, kwp: f64) -> bool {
        self.kwp_min <= kwp && kwp <= self.kwp_max
    }
}

/// Feed-in tariff bands for partial and full feed-in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedInTariffs {
    pub parts: Vec<TariffBand>,
    pub full: Vec<TariffBand>,
}

impl Default for FeedInTariffs {
    fn default() -> Self {
        Self {
            parts: vec![
                TariffBand::new(0.0, 10.0, 7.86),
                TariffBand::new(10.01, 40.0, 6.80),
                TariffBand::new(40.01, 100.0, 5.56),
            ],
            full: vec![
                TariffBand::new(0.0, 10.0, 12.47),
                TariffBand::new(10.01, 40.0, 10.45),
                TariffBand::new(40.01, 100.0, 10.45),
            ],
        }
    }
}

impl FeedInTariffs {
    /// Bands for a mode (`"full"`, anything else is `"parts"`)
    ///
    /// Empty configured bands fall back to the built-in table.
    pub fn bands(&self, mode: &str) -> Vec<TariffBand> {
        let (configured, builtin) = match mode {
            "full" => (&self.full, FeedInTariffs::default().full),
            _ => (&self.parts, FeedInTariffs::default().parts),
        };
        if configured.is_empty() {
            builtin
        } else {
            configured.clone()
        }
    }
}

/// Diagonal watermark drawn under every overlay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkSettings {
    #[serde(deserialize_with = "truthy")]
    pub enabled: bool,
    pub text: String,
    pub opacity: f64,
}

impl Default for WatermarkSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            text: "VERTRAULICH".to_string(),
            opacity: 0.10,
        }
    }
}

impl WatermarkSettings {
    pub fn effective_text(&self) -> &str {
        match self.text.trim() {
            "" => "VERTRAULICH",
            text => text,
        }
    }

    /// Opacity clamped to 0.02 - 0.3
    pub fn effective_opacity(&self) -> f64 {
        if self.opacity.is_finite() {
            self.opacity.clamp(0.02, 0.3)
        } else {
            0.10
        }
    }
}

/// Whether a loosely typed flag is set
///
/// Booleans and non-zero numbers count, as do the strings `1`, `true`,
/// `yes` and `on` (case-insensitive).
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|v| v != 0.0).unwrap_or(false),
        Value::String(s) => matches!(
            s.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        _ => false,
    }
}

fn truthy<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(is_truthy(&value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_defaults_from_empty_json() {
        let settings = Settings::from_json("{}").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.electricity_price_increase_annual_percent, 5.0);
        assert!(!settings.watermark.enabled);
        assert_eq!(settings.feed_in_tariffs.parts.len(), 3);
    }

    #[test]
    fn test_watermark_truthy_strings() {
        for flag in ["1", "true", "Yes", " on "] {
            let json = format!(r#"{{"watermark": {{"enabled": "{flag}"}}}}"#);
            assert!(Settings::from_json(&json).unwrap().watermark.enabled, "{flag}");
        }
        let settings = Settings::from_json(r#"{"watermark": {"enabled": "nein"}}"#).unwrap();
        assert!(!settings.watermark.enabled);
        let settings = Settings::from_json(r#"{"watermark": {"enabled": true}}"#).unwrap();
        assert!(settings.watermark.enabled);
    }

    #[test]
    fn test_watermark_effective_values() {
        let wm = WatermarkSettings {
            enabled: true,
            text: "  ".to_string(),
            opacity: 0.9,
        };
        assert_eq!(wm.effective_text(), "VERTRAULICH");
        assert_eq!(wm.effective_opacity(), 0.3);

        let wm = WatermarkSettings {
            opacity: 0.0,
            ..wm
        };
        assert_eq!(wm.effective_opacity(), 0.02);
    }

    #[test]
    fn test_partial_tariffs() {
        let settings =
            Settings::from_json(r#"{"feed_in_tariffs": {"parts": [{"kwp_min": 0, "kwp_max": 30, "ct_per_kwh": 8.1}]}}"#)
                .unwrap();
        assert_eq!(settings.feed_in_tariffs.bands("parts"), vec![TariffBand::new(0.0, 30.0, 8.1)]);
        // untouched mode keeps the built-in bands
        assert_eq!(settings.feed_in_tariffs.bands("full")[0].ct_per_kwh, 12.47);
    }

    #[test]
    fn test_empty_bands_fall_back() {
        let tariffs = FeedInTariffs {
            parts: Vec::new(),
            full: Vec::new(),
        };
        assert_eq!(tariffs.bands("parts"), FeedInTariffs::default().parts);
    }

    #[test]
    fn test_is_truthy() {
        assert!(is_truthy(&json!(1)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!("off")));
    }
}
