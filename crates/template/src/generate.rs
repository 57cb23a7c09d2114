//! Offer generation pipeline
//!
//! Resolver, then one overlay per template page, then the compositor.

use crate::compositor::{composite, TemplateSet};
use crate::renderer::{load_font_dir, OverlayRenderer};
use crate::resolver::{resolve, GenerationRequest};
use crate::settings::Settings;
use crate::Result;

/// Pages of the finished offer: template pages plus tail pages
///
/// An unreadable tail counts as zero pages.
pub fn total_page_count(templates: &TemplateSet, tail: Option<&[u8]>) -> usize {
    let tail_pages = match tail.map(pdf_core::page_count) {
        Some(Ok(count)) => count,
        Some(Err(e)) => {
            log::warn!("tail document unreadable: {e}");
            0
        }
        None => 0,
    };
    templates.page_count() + tail_pages
}

/// Generate the offer PDF
///
/// # Arguments
/// * `request` - Customer, company, results and project records
/// * `settings` - Settings snapshot
/// * `templates` - Template backgrounds and coordinate elements
/// * `tail` - Optional document appended after the template pages
///
/// # Returns
/// The finished PDF bytes
pub fn generate_offer(
    request: &GenerationRequest,
    settings: &Settings,
    templates: &TemplateSet,
    tail: Option<&[u8]>,
) -> Result<Vec<u8>> {
    let total_pages = settings
        .total_pages
        .unwrap_or_else(|| total_page_count(templates, tail));
    let data = resolve(request, settings, total_pages);

    let fonts = match &settings.font_dir {
        Some(dir) => load_font_dir(dir).unwrap_or_else(|e| {
            log::warn!("font directory {} skipped: {e}", dir.display());
            Vec::new()
        }),
        None => Vec::new(),
    };
    let renderer = OverlayRenderer::new().with_fonts(fonts);

    let overlays = templates
        .pages()
        .iter()
        .enumerate()
        .map(|(i, page)| {
            renderer.render_page(
                i + 1,
                &page.elements,
                &data,
                settings,
                total_pages,
                page.background_size(),
            )
        })
        .collect::<Result<Vec<_>>>()?;

    let pdf = composite(&overlays, templates.pages(), tail)?;
    log::info!(
        "generated offer: {} template pages, {} total, {} bytes",
        templates.page_count(),
        total_pages,
        pdf.len()
    );
    Ok(pdf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::PageSpec;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_total_page_count_without_tail() {
        let templates = TemplateSet::new(vec![PageSpec::default(); 7]);
        assert_eq!(total_page_count(&templates, None), 7);
        assert_eq!(total_page_count(&templates, Some(b"junk")), 7);
    }

    #[test]
    fn test_generate_blank_templates() {
        let templates = TemplateSet::new(vec![PageSpec::default(); 3]);
        let pdf = generate_offer(
            &GenerationRequest::default(),
            &Settings::default(),
            &templates,
            None,
        )
        .unwrap();
        assert_eq!(pdf_core::page_count(&pdf).unwrap(), 3);
    }

    #[test]
    fn test_generate_empty_set_fails() {
        let result = generate_offer(
            &GenerationRequest::default(),
            &Settings::default(),
            &TemplateSet::default(),
            None,
        );
        assert!(matches!(result, Err(crate::TemplateError::NothingToRender)));
    }
}
