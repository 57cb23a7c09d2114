//! Offer Format - number, money and date formatting for German offer documents
//!
//! This crate provides:
//! - German number formatting (`8.251,92 kWh`)
//! - Tolerant float coercion for loosely typed inputs ("8,4 kWp", "1.945 kWh")
//! - "Nice" axis scaling for charts (1/2/5 x 10^n)
//! - Integer percentage partitions that always sum to 100
//! - German date formatting
//!
//! # Example
//!
//! ```
//! use offer_format::{fmt_number, parse_float, nice_ceiling};
//!
//! assert_eq!(fmt_number(Some(8251.92), 2, "kWh"), "8.251,92 kWh");
//! assert_eq!(parse_float("8,4 kWp"), Some(8.4));
//! assert_eq!(nice_ceiling(58230.61), 100000.0);
//! ```

mod date;
mod number;
mod percent;
mod scale;

pub use date::{format_german_date, offer_date_label, parse_iso_date};
pub use number::{coerce_float, fmt_number, fmt_str, group_thousands, parse_float, parse_money};
pub use percent::{largest_remainder_percentages, Partition};
pub use scale::{axis_ticks, nice_ceiling, nice_step};

use thiserror::Error;

/// Errors that can occur during strict formatting operations
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid number: {0}")]
    InvalidNumber(String),
}

/// Result type for formatting operations
pub type Result<T> = std::result::Result<T, FormatError>;
