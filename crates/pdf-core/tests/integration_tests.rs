//! Integration tests for pdf-core
//!
//! These tests build overlays, stamp them onto hand-made template PDFs and
//! read the result back with lopdf.

use lopdf::{dictionary, Document, Object, Stream};
use pdf_core::{
    page_count, page_size, Align, Canvas, Color, DocumentBuilder, ImageScaleMode, Layer, PdfError,
};
use pretty_assertions::assert_eq;

/// Create a template PDF whose MediaBox lives on the page tree node
///
/// Each page draws a compressed rectangle so compositing has to carry
/// filters and inherited attributes over.
fn create_template_pdf(pages: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for i in 0..pages {
        let mut stream = Stream::new(
            dictionary! {},
            format!("0.9 0.9 0.9 rg\n0 0 595.28 841.89 re\nf\n% background {}\n", i + 1)
                .into_bytes(),
        );
        stream.compress().unwrap();
        let contents_id = doc.add_object(stream);

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => contents_id,
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
            "MediaBox" => vec![0.into(), 0.into(), 595.28.into(), 841.89.into()],
            "Resources" => dictionary! {},
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// Create a small PNG with a transparent corner
fn create_test_png() -> Vec<u8> {
    use image::{ImageBuffer, Rgba};

    let img = ImageBuffer::from_fn(16, 8, |x, y| {
        if x < 2 && y < 2 {
            Rgba([0u8, 0, 0, 0])
        } else {
            Rgba([200u8, 30, 30, 255])
        }
    });
    let mut buffer = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut buffer), image::ImageFormat::Png)
        .unwrap();
    buffer
}

/// Concatenated, decompressed content of every stream in a document
fn all_stream_text(doc: &Document) -> String {
    let mut text = String::new();
    for object in doc.objects.values() {
        if let Object::Stream(stream) = object {
            let data = stream
                .decompressed_content()
                .unwrap_or_else(|_| stream.content.clone());
            text.push_str(&String::from_utf8_lossy(&data));
        }
    }
    text
}

#[test]
fn test_inherited_media_box() {
    let template = create_template_pdf(1);
    let (w, h) = page_size(&template, 1).unwrap();
    assert!((w - 595.28).abs() < 1e-3);
    assert!((h - 841.89).abs() < 1e-3);
}

#[test]
fn test_overlay_stamped_on_template() {
    let template = create_template_pdf(1);

    let mut canvas = Canvas::a4();
    canvas.draw_text(
        "Max Mustermann",
        70.0,
        700.0,
        Align::Left,
        "Helvetica",
        10.0,
        Color::black(),
    );
    let overlay = canvas.finish().unwrap();

    let mut builder = DocumentBuilder::new();
    builder
        .add_layered_page(
            &[Layer::full_page(&template), Layer::full_page(&overlay)],
            None,
        )
        .unwrap();
    let output = builder.finish().unwrap();

    let doc = Document::load_mem(&output).unwrap();
    assert_eq!(doc.get_pages().len(), 1);

    let streams = all_stream_text(&doc);
    assert!(streams.contains("% background 1"));
    assert!(streams.contains("(Max Mustermann) Tj"));
}

#[test]
fn test_page_per_template_page() {
    let template = create_template_pdf(3);
    assert_eq!(page_count(&template).unwrap(), 3);

    let mut builder = DocumentBuilder::new();
    for page in 1..=3 {
        let layer = Layer {
            page,
            ..Layer::full_page(&template)
        };
        builder.add_layered_page(&[layer], None).unwrap();
    }
    let output = builder.finish().unwrap();

    let doc = Document::load_mem(&output).unwrap();
    assert_eq!(doc.get_pages().len(), 3);
    let streams = all_stream_text(&doc);
    for page in 1..=3 {
        assert!(streams.contains(&format!("% background {page}")));
    }
}

#[test]
fn test_invalid_layer_page() {
    let template = create_template_pdf(1);
    let mut builder = DocumentBuilder::new();
    let layer = Layer {
        page: 5,
        ..Layer::full_page(&template)
    };

    match builder.add_layered_page(&[layer], None) {
        Err(PdfError::InvalidPage(page, count)) => {
            assert_eq!(page, 5);
            assert_eq!(count, 1);
        }
        other => panic!("Expected InvalidPage error, got {other:?}"),
    }
}

#[test]
fn test_png_with_transparency_and_dedup() {
    let png = create_test_png();

    let mut canvas = Canvas::a4();
    let (w, h) = canvas
        .draw_image(&png, 20.0, 20.0, 100.0, 100.0, ImageScaleMode::FitBox)
        .unwrap();
    // 16x8 fitted into a square keeps its 2:1 aspect ratio
    assert!((w - 100.0).abs() < 1e-9);
    assert!((h - 50.0).abs() < 1e-9);

    canvas
        .draw_image(&png, 200.0, 20.0, 100.0, 100.0, ImageScaleMode::Stretch)
        .unwrap();

    let bytes = canvas.finish().unwrap();
    let doc = Document::load_mem(&bytes).unwrap();

    let images: Vec<_> = doc
        .objects
        .values()
        .filter_map(|obj| obj.as_stream().ok())
        .filter(|s| {
            s.dict
                .get(b"Subtype")
                .and_then(|o| o.as_name())
                .map(|n| n == b"Image")
                .unwrap_or(false)
        })
        .collect();
    // one image plus its soft mask
    assert_eq!(images.len(), 2);
    assert!(images.iter().any(|s| s.dict.get(b"SMask").is_ok()));
}

#[test]
fn test_append_tail_document() {
    let template = create_template_pdf(1);
    let tail = create_template_pdf(2);

    let mut builder = DocumentBuilder::new();
    builder
        .add_layered_page(&[Layer::full_page(&template)], None)
        .unwrap();
    assert_eq!(builder.append_document(&tail).unwrap(), 2);

    let output = builder.finish().unwrap();
    assert_eq!(page_count(&output).unwrap(), 3);

    // appended pages keep the size they inherited from their old parent
    let (w, h) = page_size(&output, 3).unwrap();
    assert!((w - 595.28).abs() < 1e-3);
    assert!((h - 841.89).abs() < 1e-3);
}

#[test]
fn test_watermark_style_drawing() {
    let mut canvas = Canvas::a4();
    canvas.save_state();
    canvas.set_alpha(0.15);
    canvas.translate(297.64, 420.945);
    canvas.rotate(45.0);
    canvas.draw_text(
        "MUSTER",
        0.0,
        0.0,
        Align::Center,
        "Helvetica-Bold",
        96.0,
        Color::gray(0.5),
    );
    canvas.restore_state();

    let ops = String::from_utf8_lossy(canvas.content()).into_owned();
    assert!(ops.contains("/GS1 gs"));
    assert!(ops.contains("1 0 0 1 297.64 420.945 cm"));
    assert!(ops.contains("0.7071 0.7071 -0.7071 0.7071 0 0 cm"));
    assert!(ops.starts_with("q\n"));
    assert!(ops.ends_with("Q\n"));

    let bytes = canvas.finish().unwrap();
    let doc = Document::load_mem(&bytes).unwrap();
    let streams = all_stream_text(&doc);
    assert!(streams.contains("(MUSTER) Tj"));
}
