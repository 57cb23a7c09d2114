//! German date formatting

use crate::{FormatError, Result};
use chrono::{Datelike, NaiveDate};

/// Format a date as `dd.mm.YYYY`
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use offer_format::format_german_date;
/// let date = NaiveDate::from_ymd_opt(2024, 11, 29).unwrap();
/// assert_eq!(format_german_date(date), "29.11.2024");
/// ```
pub fn format_german_date(date: NaiveDate) -> String {
    format!("{:02}.{:02}.{:04}", date.day(), date.month(), date.year())
}

/// Footer label for an offer issued on `date` (e.g. "Angebot, 29.11.2024")
pub fn offer_date_label(date: NaiveDate) -> String {
    format!("Angebot, {}", format_german_date(date))
}

/// Parse an ISO (`YYYY-MM-DD`) or German (`dd.mm.YYYY`) date
pub fn parse_iso_date(text: &str) -> Result<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(text, "%d.%m.%Y"))
        .map_err(|_| FormatError::InvalidDate(text.to_string()))
}
