//! German number formatting and tolerant numeric coercion

use serde_json::Value;

/// Format a number with German separators and an optional unit suffix
///
/// Thousands are grouped with `.`, decimals are separated with `,`.
/// A non-empty suffix is appended after a single space. Missing or
/// non-finite input renders as zero instead of failing.
///
/// # Arguments
/// * `value` - Number to format
/// * `decimals` - Number of decimal places
/// * `suffix` - Unit suffix (e.g. "kWh", "€"), empty for none
///
/// # Examples
/// ```
/// use offer_format::fmt_number;
/// assert_eq!(fmt_number(Some(1234567.891), 2, ""), "1.234.567,89");
/// assert_eq!(fmt_number(Some(6000.0), 0, "kWh"), "6.000 kWh");
/// assert_eq!(fmt_number(None, 0, "kWh"), "0 kWh");
/// ```
pub fn fmt_number(value: Option<f64>, decimals: usize, suffix: &str) -> String {
    let body = match value {
        Some(n) if n.is_finite() => render_german(n, decimals),
        _ => render_german(0.0, decimals),
    };

    if suffix.is_empty() {
        body
    } else {
        format!("{body} {suffix}")
    }
}

/// Format a loosely typed string value, coercing it through [`parse_float`] first
pub fn fmt_str(value: &str, decimals: usize, suffix: &str) -> String {
    fmt_number(parse_float(value), decimals, suffix)
}

/// Render a float with German separators
fn render_german(n: f64, decimals: usize) -> String {
    let multiplier = 10_f64.powi(decimals as i32);
    let rounded = (n.abs() * multiplier).round();

    let int_part = (rounded / multiplier).floor() as u64;
    let frac_part = (rounded - (int_part as f64) * multiplier).round() as u64;

    let int_str = group_thousands(int_part, '.');
    let sign = if n < 0.0 && rounded > 0.0 { "-" } else { "" };

    if decimals > 0 {
        format!("{sign}{int_str},{frac_part:0>width$}", width = decimals)
    } else {
        format!("{sign}{int_str}")
    }
}

/// Format an integer with a thousands separator
///
/// # Examples
/// ```
/// use offer_format::group_thousands;
/// assert_eq!(group_thousands(8400, '.'), "8.400");
/// assert_eq!(group_thousands(999, '.'), "999");
/// ```
pub fn group_thousands(n: u64, sep: char) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);

    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(sep);
        }
        result.push(c);
    }

    result
}

/// Parse a float out of a German-formatted or unit-suffixed string
///
/// Everything except digits, `,`, `.` and `-` is dropped and `,` becomes the
/// decimal point; with a comma present, earlier dots are thousands separators.
/// Several dots and no comma only parse as three-digit grouping
/// (`1.945.000`), anything else such as `1.5.2` is rejected. Returns `None`
/// instead of failing.
///
/// # Examples
/// ```
/// use offer_format::parse_float;
/// assert_eq!(parse_float("8,4 kWp"), Some(8.4));
/// assert_eq!(parse_float("8.251,92 kWh"), Some(8251.92));
/// assert_eq!(parse_float("1.945.000"), Some(1945000.0));
/// assert_eq!(parse_float("-"), None);
/// ```
pub fn parse_float(text: &str) -> Option<f64> {
    let kept: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .collect();

    if !kept.contains(',') && kept.matches('.').count() >= 2 {
        return parse_dot_grouped(&kept);
    }

    let cleaned = kept.replace(',', ".");
    if cleaned.is_empty() || cleaned == "-" || cleaned == "." {
        return None;
    }

    let normalized = match cleaned.rfind('.') {
        Some(last) if cleaned[..last].contains('.') => {
            let (head, tail) = cleaned.split_at(last);
            format!("{}{}", head.replace('.', ""), tail)
        }
        _ => cleaned,
    };

    normalized.parse::<f64>().ok()
}

/// `1.945.000`: every group after a dot must have exactly three digits
fn parse_dot_grouped(kept: &str) -> Option<f64> {
    let mut groups = kept.split('.');
    let head = groups.next()?;
    let grouped = groups.all(|g| g.len() == 3 && g.chars().all(|c| c.is_ascii_digit()));
    if !grouped || head.trim_start_matches('-').is_empty() {
        return None;
    }
    kept.replace('.', "").parse::<f64>().ok()
}

/// Parse a money string such as `58.230,61 €`
///
/// Keeps digits and separators, drops thousands dots and converts the decimal
/// comma. Returns `0.0` for anything unparseable.
pub fn parse_money(text: &str) -> f64 {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.'))
        .filter(|c| *c != '.')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    cleaned.parse::<f64>().unwrap_or(0.0)
}

/// Coerce a JSON value into a float
///
/// Numbers are taken as-is, strings go through [`parse_float`], booleans and
/// everything else yield `None`.
pub fn coerce_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => parse_float(s),
        _ => None,
    }
}
