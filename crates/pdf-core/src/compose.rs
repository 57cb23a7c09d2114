//! Page compositing
//!
//! Pages of existing PDFs are imported as Form XObjects and stamped onto new
//! pages in layer order (background first). Whole documents can also be
//! appended page by page.

use crate::text::pdf_num as n;
use crate::{PdfError, Result};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

/// Fallback page size (A4 portrait) when no MediaBox is found
const FALLBACK_MEDIA_BOX: [f64; 4] = [0.0, 0.0, 595.28, 841.89];

/// Maximum depth followed up the page tree for inherited attributes
const MAX_INHERITANCE_DEPTH: usize = 10;

/// Load a PDF from memory
pub fn load_pdf(bytes: &[u8]) -> Result<Document> {
    Document::load_mem(bytes).map_err(|e| PdfError::OpenError(e.to_string()))
}

/// Number of pages in a PDF
pub fn page_count(bytes: &[u8]) -> Result<usize> {
    Ok(load_pdf(bytes)?.get_pages().len())
}

/// Width and height of a page (1-indexed) in points
pub fn page_size(bytes: &[u8], page: usize) -> Result<(f64, f64)> {
    let doc = load_pdf(bytes)?;
    let page_id = page_id(&doc, page)?;
    let [x0, y0, x1, y1] = media_box(&doc, page_id);
    Ok((x1 - x0, y1 - y0))
}

fn page_id(doc: &Document, page: usize) -> Result<ObjectId> {
    let pages = doc.get_pages();
    pages
        .get(&(page as u32))
        .copied()
        .ok_or(PdfError::InvalidPage(page, pages.len()))
}

/// Look up a page attribute, following the Parent chain if needed
fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current_id = page_id;

    for _ in 0..MAX_INHERITANCE_DEPTH {
        let dict = doc.get_object(current_id).ok()?.as_dict().ok()?;

        if let Ok(value) = dict.get(key) {
            return Some(value.clone());
        }

        match dict.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => current_id = *parent_id,
            _ => break,
        }
    }

    None
}

fn number(obj: &Object) -> Option<f64> {
    obj.as_f32()
        .map(|v| v as f64)
        .ok()
        .or_else(|| obj.as_i64().ok().map(|v| v as f64))
}

/// Effective MediaBox of a page, falling back to A4
fn media_box(doc: &Document, page_id: ObjectId) -> [f64; 4] {
    let array = match inherited_attribute(doc, page_id, b"MediaBox") {
        Some(Object::Array(arr)) => arr,
        Some(Object::Reference(id)) => match doc.get_object(id) {
            Ok(Object::Array(arr)) => arr.clone(),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    let values: Vec<f64> = array.iter().filter_map(number).collect();
    if values.len() >= 4 {
        [values[0], values[1], values[2], values[3]]
    } else {
        FALLBACK_MEDIA_BOX
    }
}

/// Effective resource dictionary of a page
fn resources(doc: &Document, page_id: ObjectId) -> Dictionary {
    match inherited_attribute(doc, page_id, b"Resources") {
        Some(Object::Dictionary(dict)) => dict,
        Some(Object::Reference(id)) => doc
            .get_object(id)
            .ok()
            .and_then(|obj| obj.as_dict().ok())
            .cloned()
            .unwrap_or_default(),
        _ => Dictionary::new(),
    }
}

/// One page of a source PDF stamped onto a composed page
#[derive(Debug, Clone, Copy)]
pub struct Layer<'a> {
    /// Source PDF bytes
    pub pdf: &'a [u8],
    /// Source page (1-indexed)
    pub page: usize,
    /// Uniform scale factor
    pub scale: f64,
    /// Horizontal offset in points
    pub tx: f64,
    /// Vertical offset in points
    pub ty: f64,
}

impl<'a> Layer<'a> {
    /// First page of `pdf`, unscaled at the origin
    pub fn full_page(pdf: &'a [u8]) -> Self {
        Self {
            pdf,
            page: 1,
            scale: 1.0,
            tx: 0.0,
            ty: 0.0,
        }
    }

    /// Place the layer scaled and offset
    pub fn placed(mut self, scale: f64, tx: f64, ty: f64) -> Self {
        self.scale = scale;
        self.tx = tx;
        self.ty = ty;
        self
    }
}

/// Builds an output document page by page
pub struct DocumentBuilder {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<ObjectId>,
    next_form: usize,
}

impl Default for DocumentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentBuilder {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            kids: Vec::new(),
            next_form: 1,
        }
    }

    /// Pages added so far
    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Move all objects of `source` into the output, renumbered past ours
    fn absorb(&mut self, mut source: Document) -> Document {
        source.renumber_objects_with(self.doc.max_id + 1);
        self.doc.max_id = self.doc.max_id.max(source.max_id);
        for (id, object) in source.objects.iter() {
            self.doc.objects.insert(*id, object.clone());
        }
        source
    }

    /// Import a page of `pdf` as a Form XObject
    ///
    /// # Returns
    /// Object ID of the form and the source page's MediaBox
    fn import_page_as_form(&mut self, pdf: &[u8], page: usize) -> Result<(ObjectId, [f64; 4])> {
        let source = self.absorb(load_pdf(pdf)?);
        let page_id = page_id(&source, page)?;

        let content = source.get_page_content(page_id)?;
        let bbox = media_box(&source, page_id);
        let resources = resources(&source, page_id);

        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name(b"XObject".to_vec()));
        dict.set("Subtype", Object::Name(b"Form".to_vec()));
        dict.set("FormType", Object::Integer(1));
        dict.set(
            "BBox",
            Object::Array(bbox.iter().map(|v| Object::Real(*v as f32)).collect()),
        );
        dict.set("Resources", Object::Dictionary(resources));

        Ok((self.doc.add_object(Stream::new(dict, content)), bbox))
    }

    /// Add a page made of stacked layers
    ///
    /// Layers are drawn in order, so the first one ends up at the bottom.
    /// The page takes the given size, or the first layer's size when `None`.
    pub fn add_layered_page(
        &mut self,
        layers: &[Layer<'_>],
        size: Option<(f64, f64)>,
    ) -> Result<()> {
        let mut content = String::new();
        let mut xobjects = Dictionary::new();
        let mut page_size = size;

        for layer in layers {
            let (form_id, bbox) = self.import_page_as_form(layer.pdf, layer.page)?;
            if page_size.is_none() {
                page_size = Some((bbox[2] - bbox[0], bbox[3] - bbox[1]));
            }

            let name = format!("X{}", self.next_form);
            self.next_form += 1;
            xobjects.set(name.as_str(), Object::Reference(form_id));

            content.push_str(&format!(
                "q\n{} 0 0 {} {} {} cm\n/{} Do\nQ\n",
                n(layer.scale),
                n(layer.scale),
                n(layer.tx),
                n(layer.ty),
                name
            ));
        }

        let (width, height) =
            page_size.unwrap_or((FALLBACK_MEDIA_BOX[2], FALLBACK_MEDIA_BOX[3]));
        let content_id = self
            .doc
            .add_object(Stream::new(Dictionary::new(), content.into_bytes()));

        let mut resources = Dictionary::new();
        resources.set("XObject", Object::Dictionary(xobjects));

        let mut page = Dictionary::new();
        page.set("Type", Object::Name(b"Page".to_vec()));
        page.set("Parent", Object::Reference(self.pages_id));
        page.set(
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(width as f32),
                Object::Real(height as f32),
            ]),
        );
        page.set("Resources", Object::Dictionary(resources));
        page.set("Contents", Object::Reference(content_id));

        let page_id = self.doc.add_object(page);
        self.kids.push(page_id);
        Ok(())
    }

    /// Append every page of another PDF unchanged
    ///
    /// # Returns
    /// Number of pages appended
    pub fn append_document(&mut self, pdf: &[u8]) -> Result<usize> {
        let source = self.absorb(load_pdf(pdf)?);
        let pages = source.get_pages();

        for page_id in pages.values() {
            // Inherited attributes must be pinned before the page changes parent.
            let bbox = media_box(&source, *page_id);
            let resources = resources(&source, *page_id);

            let mut dict = self
                .doc
                .get_object(*page_id)?
                .as_dict()
                .map_err(|_| PdfError::ParseError("Page object is not a dictionary".to_string()))?
                .clone();

            dict.set("Parent", Object::Reference(self.pages_id));
            dict.set(
                "MediaBox",
                Object::Array(bbox.iter().map(|v| Object::Real(*v as f32)).collect()),
            );
            dict.set("Resources", Object::Dictionary(resources));

            self.doc.objects.insert(*page_id, Object::Dictionary(dict));
            self.kids.push(*page_id);
        }

        Ok(pages.len())
    }

    /// Write the document
    pub fn finish(mut self) -> Result<Vec<u8>> {
        let mut pages = Dictionary::new();
        pages.set("Type", Object::Name(b"Pages".to_vec()));
        pages.set(
            "Kids",
            Object::Array(self.kids.iter().map(|id| Object::Reference(*id)).collect()),
        );
        pages.set("Count", Object::Integer(self.kids.len() as i64));
        self.doc
            .objects
            .insert(self.pages_id, Object::Dictionary(pages));

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(self.pages_id));
        let catalog_id = self.doc.add_object(catalog);
        self.doc.trailer.set("Root", Object::Reference(catalog_id));

        // Drop source catalogs and page trees nothing points to any more.
        let pruned = self.doc.prune_objects();
        log::debug!("pruned {} unreachable objects", pruned.len());
        self.doc.compress();

        let mut out = Vec::new();
        self.doc
            .save_to(&mut out)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Align, Canvas, Color};
    use pretty_assertions::assert_eq;

    fn canvas_pdf(label: &str, width: f64, height: f64) -> Vec<u8> {
        let mut canvas = Canvas::new(width, height);
        canvas.draw_text(label, 10.0, 10.0, Align::Left, "Helvetica", 10.0, Color::black());
        canvas.finish().unwrap()
    }

    #[test]
    fn test_page_size_and_count() {
        let pdf = canvas_pdf("x", 300.0, 200.0);
        assert_eq!(page_count(&pdf).unwrap(), 1);
        let (w, h) = page_size(&pdf, 1).unwrap();
        assert!((w - 300.0).abs() < 1e-3);
        assert!((h - 200.0).abs() < 1e-3);
    }

    #[test]
    fn test_invalid_page() {
        let pdf = canvas_pdf("x", 300.0, 200.0);
        assert!(matches!(page_size(&pdf, 3), Err(PdfError::InvalidPage(3, 1))));
    }

    #[test]
    fn test_layered_page_draws_layers_in_order() {
        let background = canvas_pdf("background", 595.28, 841.89);
        let overlay = canvas_pdf("overlay", 595.28, 841.89);

        let mut builder = DocumentBuilder::new();
        builder
            .add_layered_page(
                &[Layer::full_page(&background), Layer::full_page(&overlay)],
                None,
            )
            .unwrap();
        assert_eq!(builder.page_count(), 1);

        let bytes = builder.finish().unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 1);

        let content = doc.get_page_content(*pages.get(&1).unwrap()).unwrap();
        let content = String::from_utf8_lossy(&content);
        let first = content.find("/X1 Do").unwrap();
        let second = content.find("/X2 Do").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_scaled_layer_transform() {
        let house = canvas_pdf("house", 400.0, 300.0);
        let mut builder = DocumentBuilder::new();
        builder
            .add_layered_page(
                &[Layer::full_page(&house).placed(0.3, 237.68, 375.945)],
                Some((595.28, 841.89)),
            )
            .unwrap();

        let bytes = builder.finish().unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        let page_id = *doc.get_pages().get(&1).unwrap();
        let content = doc.get_page_content(page_id).unwrap();
        assert!(String::from_utf8_lossy(&content).contains("0.3 0 0 0.3 237.68 375.945 cm"));
    }

    #[test]
    fn test_append_document_keeps_pages() {
        let first = canvas_pdf("one", 595.28, 841.89);
        let tail = canvas_pdf("tail", 595.28, 841.89);

        let mut builder = DocumentBuilder::new();
        builder.add_layered_page(&[Layer::full_page(&first)], None).unwrap();
        assert_eq!(builder.append_document(&tail).unwrap(), 1);
        assert_eq!(builder.page_count(), 2);

        let bytes = builder.finish().unwrap();
        assert_eq!(page_count(&bytes).unwrap(), 2);

        let doc = Document::load_mem(&bytes).unwrap();
        let page_id = *doc.get_pages().get(&2).unwrap();
        let content = doc.get_page_content(page_id).unwrap();
        assert!(String::from_utf8_lossy(&content).contains("(tail) Tj"));
    }

    #[test]
    fn test_garbage_input_rejected() {
        let mut builder = DocumentBuilder::new();
        let result = builder.add_layered_page(&[Layer::full_page(b"garbage")], None);
        assert!(matches!(result, Err(PdfError::OpenError(_))));
    }
}
