//! Drawing blocks used by the page rules
//!
//! Each block draws one self-contained graphic onto an overlay canvas. The
//! renderer decides which blocks run on which page.

pub mod bar_chart;
pub mod donut;
pub mod images;
pub mod watermark;

use pdf_core::{Canvas, Color};

/// Brand blue of the offer artwork
pub const BRAND_BLUE: u32 = 0x1B3670;

const TRIANGLE_SIZE: f64 = 36.0;

/// Blue triangle in the top-right corner
pub fn draw_corner_triangle(canvas: &mut Canvas) {
    let (w, h) = (canvas.width(), canvas.height());
    canvas.fill_polygon(
        &[(w, h), (w - TRIANGLE_SIZE, h), (w, h - TRIANGLE_SIZE)],
        Color::from_hex(BRAND_BLUE),
    );
}

/// Replace the artwork's logo area with the installer's logo
///
/// The area is only blanked when the logo can be drawn.
pub fn draw_company_logo(canvas: &mut Canvas, payload: &str) -> crate::Result<()> {
    let bytes = images::decode_image_payload(payload)?;
    let h = canvas.height();
    canvas.fill_rect(15.0, h - 75.0, 140.0, 60.0, Color::white());
    images::draw_centred(canvas, &bytes, 20.0, h - 70.0, 120.0, 50.0)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corner_triangle() {
        let mut canvas = Canvas::new(600.0, 800.0);
        draw_corner_triangle(&mut canvas);
        let ops = String::from_utf8_lossy(canvas.content()).to_string();
        assert!(ops.contains("600 800 m\n564 800 l\n600 764 l\nh\nf\n"), "{ops}");
    }

    #[test]
    fn test_company_logo() {
        let mut canvas = Canvas::new(600.0, 800.0);
        draw_company_logo(&mut canvas, &images::tests::png_base64(20, 10)).unwrap();
        let ops = String::from_utf8_lossy(canvas.content()).to_string();
        assert!(ops.contains("15 725 140 60 re"));
        // 100 x 50 centred in the 120 x 50 slot
        assert!(ops.contains("100 0 0 50 30 730 cm"), "{ops}");
        assert!(ops.contains("/Im1 Do"));
    }

    #[test]
    fn test_bad_company_logo_leaves_artwork() {
        let mut canvas = Canvas::new(600.0, 800.0);
        assert!(draw_company_logo(&mut canvas, "%%%").is_err());
        assert!(canvas.is_empty());
    }
}
