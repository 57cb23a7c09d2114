//! Template loading and page compositing
//!
//! Each output page stacks up to three layers: the template background, an
//! optional secondary background scaled into its centre, and the rendered
//! overlay. Pages are stamped as Form XObjects, never rasterized.

use crate::coords::{self, DrawElement};
use crate::{Result, TemplateError};
use pdf_core::{page_count, page_size, DocumentBuilder, Layer, A4_HEIGHT, A4_WIDTH};
use std::path::Path;

/// Pages of the standard offer template
pub const DEFAULT_PAGE_COUNT: usize = 7;

/// Scale of the secondary background on its page
const SECONDARY_SCALE: f64 = 0.3;

/// One template page
#[derive(Debug, Clone, Default)]
pub struct PageSpec {
    /// Background PDF; its first page is used
    pub background: Option<Vec<u8>>,
    /// Secondary background centred at 30% scale
    pub secondary: Option<Vec<u8>>,
    pub elements: Vec<DrawElement>,
}

impl PageSpec {
    /// Size of the background's first page, when it is readable
    pub fn background_size(&self) -> Option<(f64, f64)> {
        self.background.as_deref().and_then(|bg| page_size(bg, 1).ok())
    }
}

/// The pages of a template directory
#[derive(Debug, Clone, Default)]
pub struct TemplateSet {
    pages: Vec<PageSpec>,
}

impl TemplateSet {
    pub fn new(pages: Vec<PageSpec>) -> Self {
        Self { pages }
    }

    /// Load the standard seven pages from a directory
    ///
    /// Backgrounds are `nt_nt_NN.pdf` or `nt_NN.pdf`, coordinates
    /// `seiteN.yml`, `seiteN.txt` or `pageN.txt`, and page 1 takes `haus.pdf`
    /// as its secondary background. Missing files leave the slot empty.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        Self::load_pages(dir, DEFAULT_PAGE_COUNT)
    }

    pub fn load_pages(dir: impl AsRef<Path>, count: usize) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(TemplateError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("template directory not found: {}", dir.display()),
            )));
        }

        let pages = (1..=count)
            .map(|index| {
                let background = read_first(
                    dir,
                    &[format!("nt_nt_{index:02}.pdf"), format!("nt_{index:02}.pdf")],
                );
                let secondary = if index == 1 {
                    read_first(dir, &["haus.pdf".to_string()])
                } else {
                    None
                };
                let elements = [
                    format!("seite{index}.yml"),
                    format!("seite{index}.txt"),
                    format!("page{index}.txt"),
                ]
                .iter()
                .map(|name| dir.join(name))
                .find(|path| path.is_file())
                .map(coords::parse_file)
                .unwrap_or_default();

                log::debug!(
                    "template page {index}: background={}, {} elements",
                    background.is_some(),
                    elements.len()
                );
                PageSpec {
                    background,
                    secondary,
                    elements,
                }
            })
            .collect();

        Ok(Self { pages })
    }

    pub fn pages(&self) -> &[PageSpec] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

fn read_first(dir: &Path, names: &[String]) -> Option<Vec<u8>> {
    let path = names.iter().map(|name| dir.join(name)).find(|p| p.is_file())?;
    match std::fs::read(&path) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            log::warn!("cannot read {}: {e}", path.display());
            None
        }
    }
}

/// The PDF when it opens and has at least one page
fn usable<'a>(pdf: Option<&'a [u8]>, what: &str, index: usize) -> Option<&'a [u8]> {
    let pdf = pdf?;
    match page_count(pdf) {
        Ok(count) if count > 0 => Some(pdf),
        Ok(_) => {
            log::warn!("page {index}: {what} has no pages, skipped");
            None
        }
        Err(e) => {
            log::warn!("page {index}: {what} unreadable, skipped: {e}");
            None
        }
    }
}

/// Stack overlays onto their template pages and append the tail document
///
/// # Arguments
/// * `overlays` - One rendered overlay PDF per page
/// * `pages` - Template pages, matched to overlays by position
/// * `tail` - Document whose pages are appended unchanged
///
/// # Returns
/// The composed PDF; `NothingToRender` when no page could be produced
pub fn composite(overlays: &[Vec<u8>], pages: &[PageSpec], tail: Option<&[u8]>) -> Result<Vec<u8>> {
    let mut builder = DocumentBuilder::new();
    let blank = PageSpec::default();

    for index in 0..pages.len().max(overlays.len()) {
        let page_number = index + 1;
        let spec = pages.get(index).unwrap_or(&blank);
        let overlay = usable(overlays.get(index).map(Vec::as_slice), "overlay", page_number);
        let background = usable(spec.background.as_deref(), "background", page_number);
        let secondary = usable(spec.secondary.as_deref(), "secondary background", page_number);

        let mut layers = Vec::new();
        let mut size = background.and_then(|bg| page_size(bg, 1).ok());
        if let Some(bg) = background {
            layers.push(Layer::full_page(bg));
        }

        if let Some(sec) = secondary {
            let (bw, bh) = size
                .or_else(|| overlay.and_then(|ov| page_size(ov, 1).ok()))
                .unwrap_or((A4_WIDTH, A4_HEIGHT));
            match page_size(sec, 1) {
                Ok((sw, sh)) => {
                    layers.push(Layer::full_page(sec).placed(
                        SECONDARY_SCALE,
                        (bw - sw * SECONDARY_SCALE) / 2.0,
                        (bh - sh * SECONDARY_SCALE) / 2.0,
                    ));
                    size = Some((bw, bh));
                }
                Err(e) => log::warn!("page {page_number}: secondary background skipped: {e}"),
            }
        }

        if let Some(ov) = overlay {
            layers.push(Layer::full_page(ov));
        }
        if layers.is_empty() {
            log::warn!("page {page_number}: nothing to draw, page dropped");
            continue;
        }

        if let Err(e) = builder.add_layered_page(&layers, size) {
            let Some(ov) = overlay else {
                log::warn!("page {page_number}: compositing failed ({e}), page dropped");
                continue;
            };
            log::warn!("page {page_number}: compositing failed ({e}), using overlay only");
            builder.add_layered_page(&[Layer::full_page(ov)], None)?;
        }
    }

    if builder.page_count() == 0 {
        return Err(TemplateError::NothingToRender);
    }

    if let Some(tail) = tail {
        match builder.append_document(tail) {
            Ok(count) => log::debug!("appended {count} tail pages"),
            Err(e) => log::warn!("tail document skipped: {e}"),
        }
    }

    Ok(builder.finish()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdf_core::{Canvas, Color};
    use pretty_assertions::assert_eq;

    fn page_pdf(width: f64, height: f64, label: &str) -> Vec<u8> {
        let mut canvas = Canvas::new(width, height);
        canvas.draw_text(label, 20.0, 20.0, pdf_core::Align::Left, "Helvetica", 10.0, Color::black());
        canvas.finish().unwrap()
    }

    #[test]
    fn test_overlay_only_pages() {
        let overlays = vec![page_pdf(595.28, 841.89, "eins"), page_pdf(595.28, 841.89, "zwei")];
        let pdf = composite(&overlays, &[], None).unwrap();
        assert_eq!(page_count(&pdf).unwrap(), 2);
    }

    #[test]
    fn test_background_sets_page_size() {
        let pages = vec![PageSpec {
            background: Some(page_pdf(600.0, 800.0, "bg")),
            ..PageSpec::default()
        }];
        let overlays = vec![page_pdf(600.0, 800.0, "ov")];
        let pdf = composite(&overlays, &pages, None).unwrap();
        assert_eq!(page_size(&pdf, 1).unwrap(), (600.0, 800.0));
    }

    #[test]
    fn test_corrupt_background_degrades() {
        let pages = vec![PageSpec {
            background: Some(b"%PDF-1.4 garbage".to_vec()),
            ..PageSpec::default()
        }];
        let overlays = vec![page_pdf(595.28, 841.89, "ov")];
        let pdf = composite(&overlays, &pages, None).unwrap();
        assert_eq!(page_count(&pdf).unwrap(), 1);
    }

    #[test]
    fn test_broken_page_without_overlay_dropped() {
        let pages = vec![
            PageSpec {
                background: Some(b"%PDF-1.4\n1 0 obj broken".to_vec()),
                ..PageSpec::default()
            },
            PageSpec {
                background: Some(page_pdf(600.0, 800.0, "bg")),
                ..PageSpec::default()
            },
        ];
        let overlays = vec![Vec::new(), page_pdf(600.0, 800.0, "ov")];
        let pdf = composite(&overlays, &pages, None).unwrap();
        assert_eq!(page_count(&pdf).unwrap(), 1);
        assert_eq!(page_size(&pdf, 1).unwrap(), (600.0, 800.0));
    }

    #[test]
    fn test_secondary_centred() {
        let pages = vec![PageSpec {
            background: Some(page_pdf(600.0, 800.0, "bg")),
            secondary: Some(page_pdf(200.0, 100.0, "haus")),
            elements: Vec::new(),
        }];
        let pdf = composite(&[page_pdf(600.0, 800.0, "ov")], &pages, None).unwrap();
        let doc = lopdf::Document::load_mem(&pdf).unwrap();
        let page_id = *doc.get_pages().get(&1).unwrap();
        let content = String::from_utf8_lossy(&doc.get_page_content(page_id).unwrap()).to_string();
        // (600 - 60) / 2, (800 - 30) / 2
        assert!(content.contains("0.3 0 0 0.3 270 385 cm"), "{content}");
    }

    #[test]
    fn test_tail_appended() {
        let tail = {
            let mut builder = DocumentBuilder::new();
            let a = page_pdf(595.28, 841.89, "a");
            builder.add_layered_page(&[Layer::full_page(&a)], None).unwrap();
            builder.add_layered_page(&[Layer::full_page(&a)], None).unwrap();
            builder.finish().unwrap()
        };
        let pdf = composite(&[page_pdf(595.28, 841.89, "ov")], &[], Some(&tail)).unwrap();
        assert_eq!(page_count(&pdf).unwrap(), 3);

        let pdf = composite(&[page_pdf(595.28, 841.89, "ov")], &[], Some(b"not a pdf")).unwrap();
        assert_eq!(page_count(&pdf).unwrap(), 1);
    }

    #[test]
    fn test_nothing_to_render() {
        assert!(matches!(
            composite(&[], &[PageSpec::default()], None),
            Err(TemplateError::NothingToRender)
        ));
    }

    #[test]
    fn test_load_missing_dir() {
        assert!(matches!(
            TemplateSet::load("/nonexistent/templates"),
            Err(TemplateError::IoError(_))
        ));
    }
}
