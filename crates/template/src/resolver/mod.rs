//! Dynamic data resolution
//!
//! Turns the four opaque request records (customer, company, results,
//! project) into a flat map of logical key to finished display string. The
//! renderer only ever reads strings from this map.
//!
//! A missing or malformed input yields the documented default, never an
//! error.

mod customer;
mod economics;
mod energy;
mod products;
mod tariff;

pub use energy::{EnergyFlows, ProductionShare, SwapEntry, PRODUCTION_LABEL_SWAP};
pub use tariff::{resolve_feed_in_tariff, FeedInMode, DEFAULT_FEED_IN_TARIFF};

use crate::settings::Settings;
use crate::{Result, TemplateError};
use chrono::NaiveDate;
use offer_format::coerce_float;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A request record: arbitrary JSON object
pub type Record = Map<String, Value>;

/// Resolved key to display string map
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DynamicData {
    values: BTreeMap<String, String>,
}

impl DynamicData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Set a value, replacing any earlier one
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DynamicData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut data = DynamicData::new();
        for (k, v) in iter {
            data.insert(k, v);
        }
        data
    }
}

/// Input of one offer generation
///
/// Missing or non-object sections read as empty records.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GenerationRequest {
    #[serde(deserialize_with = "object_or_empty")]
    pub customer: Record,
    #[serde(deserialize_with = "object_or_empty")]
    pub company: Record,
    /// Computed analysis results
    #[serde(deserialize_with = "object_or_empty")]
    pub results: Record,
    /// Project details, including an optional `products` section
    #[serde(deserialize_with = "object_or_empty")]
    pub project: Record,
}

impl GenerationRequest {
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        if !value.is_object() {
            return Err(TemplateError::ParseError(
                "generation request must be a JSON object".to_string(),
            ));
        }
        Ok(serde_json::from_value(value)?)
    }
}

fn object_or_empty<'de, D>(deserializer: D) -> std::result::Result<Record, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Object(map) => Ok(map),
        _ => Ok(Record::new()),
    }
}

/// Resolve all display values, dating the offer today
///
/// # Arguments
/// * `request` - Customer, company, results and project records
/// * `settings` - Settings snapshot
/// * `total_pages` - Page count printed in footers
pub fn resolve(request: &GenerationRequest, settings: &Settings, total_pages: usize) -> DynamicData {
    resolve_on(
        request,
        settings,
        total_pages,
        chrono::Local::now().date_naive(),
    )
}

/// Resolve all display values for an offer dated `today`
pub fn resolve_on(
    request: &GenerationRequest,
    settings: &Settings,
    total_pages: usize,
    today: NaiveDate,
) -> DynamicData {
    let mut data = DynamicData::new();

    customer::resolve(&mut data, request, today);
    products::insert_defaults(&mut data);
    let flows = energy::resolve(&mut data, request);
    let tariff = tariff::resolve(&mut data, request, settings, flows.anlage_kwp);
    economics::resolve(&mut data, request, settings, &flows, tariff, total_pages);
    products::resolve(&mut data, request, &flows);

    log::debug!("resolved {} display values", data.len());
    data
}

/// Follow a dotted path (`products.module.name`) into a record
pub(crate) fn lookup<'a>(record: &'a Record, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = record.get(segments.next()?)?;
    for segment in segments {
        current = current.get(segment)?;
    }
    Some(current)
}

/// Convert a JSON value to display text
pub(crate) fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// First non-blank text among `paths`
pub(crate) fn first_text(record: &Record, paths: &[&str]) -> Option<String> {
    paths
        .iter()
        .filter_map(|path| lookup(record, path))
        .map(value_to_string)
        .find(|text| !text.is_empty())
}

/// First value among `paths` that reads as a non-zero number
pub(crate) fn first_number(record: &Record, paths: &[&str]) -> Option<f64> {
    paths
        .iter()
        .filter_map(|path| lookup(record, path))
        .filter_map(coerce_float)
        .find(|v| v.is_finite() && *v != 0.0)
}

/// Sum of a numeric list; `None` when the list is absent or empty
pub(crate) fn list_sum(record: &Record, path: &str) -> Option<f64> {
    let items = lookup(record, path)?.as_array()?;
    if items.is_empty() {
        return None;
    }
    Some(items.iter().filter_map(coerce_float).sum())
}

/// Join the non-empty parts with single spaces
pub(crate) fn join_nonempty<S: AsRef<str>>(parts: &[S]) -> String {
    parts
        .iter()
        .map(|p| p.as_ref().trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whole-number percentage text (`54%`)
pub(crate) fn percent_text(value: f64) -> String {
    format!("{}%", value.round() as i64)
}
