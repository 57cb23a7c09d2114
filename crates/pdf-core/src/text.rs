//! Text rendering utilities

use crate::canvas::Color;
use crate::Align;

/// Context for rendering text
pub struct TextRenderContext {
    /// PDF font resource name (e.g., "F1")
    pub font_name: String,
    /// Font size in points
    pub font_size: f32,
    /// Text width in points (for alignment)
    pub text_width: f64,
    /// Text color (RGB)
    pub color: Color,
}

/// Format a number for a content stream
///
/// At most four decimals, trailing zeros trimmed, never `-0`.
pub(crate) fn pdf_num(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let s = format!("{value:.4}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    match s {
        "-0" | "" => "0".to_string(),
        _ => s.to_string(),
    }
}

/// Calculate X offset for text alignment
///
/// # Arguments
/// * `text_width` - Width of text in points
/// * `container_width` - Available width for alignment
/// * `align` - Desired alignment
pub fn calculate_x_offset(text_width: f64, container_width: f64, align: Align) -> f64 {
    match align {
        Align::Left => 0.0,
        Align::Center => (container_width - text_width) / 2.0,
        Align::Right => container_width - text_width,
    }
}

/// Write bytes as a PDF literal string
///
/// Delimiters and backslashes are escaped, bytes outside printable ASCII
/// become octal escapes.
pub fn encode_literal(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() + 2);
    out.push('(');
    for &b in bytes {
        match b {
            b'\\' | b'(' | b')' => {
                out.push('\\');
                out.push(b as char);
            }
            0x20..=0x7E => out.push(b as char),
            _ => out.push_str(&format!("\\{b:03o}")),
        }
    }
    out.push(')');
    out
}

/// Generate PDF operators for text insertion
///
/// Creates the proper PDF text operators (BT, Tf, Td, Tj, ET) to render text
/// at a specific position with alignment support.
///
/// # Arguments
/// * `encoded` - Encoded text operand, literal `(..)` or hex `<..>`
/// * `x` - X coordinate in points (PDF coordinates, from left)
/// * `y` - Y coordinate in points (PDF coordinates, from bottom)
/// * `align` - Alignment relative to `x`
/// * `ctx` - Text rendering context
pub fn generate_text_operators(
    encoded: &str,
    x: f64,
    y: f64,
    align: Align,
    ctx: &TextRenderContext,
) -> Vec<u8> {
    let x_offset = match align {
        Align::Left => 0.0,
        Align::Center => -ctx.text_width / 2.0,
        Align::Right => -ctx.text_width,
    };

    let mut ops = String::new();
    ops.push_str("BT\n");
    ops.push_str(&format!(
        "{} {} {} rg\n",
        pdf_num(ctx.color.r as f64),
        pdf_num(ctx.color.g as f64),
        pdf_num(ctx.color.b as f64)
    ));
    ops.push_str(&format!(
        "/{} {} Tf\n",
        ctx.font_name,
        pdf_num(ctx.font_size as f64)
    ));
    ops.push_str(&format!("{} {} Td\n", pdf_num(x + x_offset), pdf_num(y)));
    ops.push_str(&format!("{encoded} Tj\n"));
    ops.push_str("ET\n");

    ops.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ctx(font_name: &str, font_size: f32, text_width: f64) -> TextRenderContext {
        TextRenderContext {
            font_name: font_name.to_string(),
            font_size,
            text_width,
            color: Color::black(),
        }
    }

    #[test]
    fn test_x_offset() {
        assert_eq!(calculate_x_offset(100.0, 500.0, Align::Left), 0.0);
        assert_eq!(calculate_x_offset(100.0, 500.0, Align::Center), 200.0);
        assert_eq!(calculate_x_offset(100.0, 500.0, Align::Right), 400.0);
    }

    #[test]
    fn test_pdf_num() {
        assert_eq!(pdf_num(150.0), "150");
        assert_eq!(pdf_num(771.89), "771.89");
        assert_eq!(pdf_num(0.125), "0.125");
        assert_eq!(pdf_num(-0.00001), "0");
        assert_eq!(pdf_num(f64::NAN), "0");
    }

    #[test]
    fn test_encode_literal_escapes() {
        assert_eq!(encode_literal(b"Max Mustermann"), "(Max Mustermann)");
        assert_eq!(encode_literal(b"a(b)\\c"), "(a\\(b\\)\\\\c)");
        assert_eq!(encode_literal(&[b'S', 0xFC, b'd']), "(S\\374d)");
    }

    #[test]
    fn test_generate_text_operators_left() {
        let ops = generate_text_operators("(Hello)", 100.0, 700.0, Align::Left, &ctx("F1", 12.0, 100.0));
        let ops_str = String::from_utf8(ops).unwrap();

        assert!(ops_str.starts_with("BT\n"));
        assert!(ops_str.contains("/F1 12 Tf"));
        assert!(ops_str.contains("100 700 Td"));
        assert!(ops_str.contains("(Hello) Tj"));
        assert!(ops_str.ends_with("ET\n"));
    }

    #[test]
    fn test_generate_text_operators_center() {
        let ops = generate_text_operators("(Test)", 200.0, 600.0, Align::Center, &ctx("F2", 14.0, 100.0));
        let ops_str = String::from_utf8(ops).unwrap();

        assert!(ops_str.contains("/F2 14 Tf"));
        assert!(ops_str.contains("150 600 Td")); // 200 - 50 (half of 100)
    }

    #[test]
    fn test_generate_text_operators_right() {
        let ops = generate_text_operators("<00520069>", 300.0, 500.0, Align::Right, &ctx("F3", 16.0, 80.0));
        let ops_str = String::from_utf8(ops).unwrap();

        assert!(ops_str.contains("220 500 Td")); // 300 - 80
        assert!(ops_str.contains("<00520069> Tj"));
    }

    #[test]
    fn test_generate_text_operators_fractional_size() {
        let ops = generate_text_operators("(x)", 10.0, 20.0, Align::Left, &ctx("F1", 9.5, 4.0));
        let ops_str = String::from_utf8(ops).unwrap();
        assert!(ops_str.contains("/F1 9.5 Tf"));
    }

    #[test]
    fn test_generate_text_operators_with_color() {
        let context = TextRenderContext {
            color: Color::rgb(1.0, 0.0, 0.0),
            ..ctx("F1", 12.0, 100.0)
        };

        let ops = generate_text_operators("(A)", 100.0, 700.0, Align::Left, &context);
        let ops_str = String::from_utf8(ops).unwrap();

        assert!(ops_str.contains("1 0 0 rg"));
    }
}
