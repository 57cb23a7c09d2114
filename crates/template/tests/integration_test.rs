//! Integration tests for offer generation
//!
//! Template directories are written to a scratch folder with hand-made
//! background PDFs, then the finished offer is read back with lopdf.

use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use offer_template::{
    composite, coords, generate_offer, total_page_count, GenerationRequest, OverlayRenderer,
    PageSpec, Settings, TemplateError, TemplateSet, DEFAULT_PAGE_COUNT,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::path::PathBuf;

/// One-page background whose MediaBox sits on the page
fn background_pdf(width: f32, height: f32) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut stream = Stream::new(
        dictionary! {},
        b"0.95 0.95 0.95 rg\n0 0 100 100 re\nf\n".to_vec(),
    );
    stream.compress().unwrap();
    let contents_id = doc.add_object(stream);

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => contents_id,
        "MediaBox" => vec![0.into(), 0.into(), Object::Real(width), Object::Real(height)],
        "Resources" => dictionary! {},
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
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

/// Scratch template directory, emptied on creation
fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("offer-template-{}-{name}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn record(text: &str, position: &str) -> String {
    format!("Text: {text}\nPosition: {position}\nFontName: Helvetica\nFontSize: 10\nColor: 0\n-----\n")
}

/// Decompressed content of every form drawn on a page
fn page_text(doc: &Document, page_id: ObjectId) -> String {
    let page = doc.get_dictionary(page_id).unwrap();
    let xobjects = page
        .get(b"Resources")
        .and_then(Object::as_dict)
        .and_then(|resources| resources.get(b"XObject"))
        .and_then(Object::as_dict)
        .unwrap();

    let mut text = String::new();
    for (_, object) in xobjects.iter() {
        let stream = doc
            .get_object(object.as_reference().unwrap())
            .and_then(Object::as_stream)
            .unwrap();
        let content = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());
        text.push_str(&String::from_utf8_lossy(&content));
    }
    text
}

fn request() -> GenerationRequest {
    GenerationRequest::from_json(
        &json!({
            "customer": { "first_name": "Max", "last_name": "Mustermann" },
            "results": { "anlage_kwp": 8.4, "annual_pv_production_kwh": 8251.92 }
        })
        .to_string(),
    )
    .unwrap()
}

#[test]
fn test_end_to_end_seven_pages() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = scratch_dir("e2e");

    for index in 1..=DEFAULT_PAGE_COUNT {
        // Page 2 uses the short background name
        let name = if index == 2 {
            format!("nt_{index:02}.pdf")
        } else {
            format!("nt_nt_{index:02}.pdf")
        };
        std::fs::write(dir.join(name), background_pdf(595.28, 841.89)).unwrap();

        let mut descriptor = record("qwe qe", "60, 100, 250, 112");
        if index == 2 {
            descriptor.push_str(&record("{{anlage_kwp}}", "60, 200, 250, 212"));
        }
        std::fs::write(dir.join(format!("seite{index}.yml")), descriptor).unwrap();
    }

    let templates = TemplateSet::load(&dir).unwrap();
    assert_eq!(templates.page_count(), 7);
    assert_eq!(total_page_count(&templates, None), 7);

    let pdf = generate_offer(&request(), &Settings::default(), &templates, None).unwrap();
    let doc = Document::load_mem(&pdf).unwrap();
    let pages = doc.get_pages();
    assert_eq!(pages.len(), 7);

    for (number, page_id) in &pages {
        let text = page_text(&doc, *page_id);
        assert!(text.contains("(Max Mustermann) Tj"), "page {number}: {text}");
    }
    let page2 = page_text(&doc, pages[&2]);
    assert!(page2.contains("(8,40 kWp) Tj"), "{page2}");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_degraded_composite_keeps_page() {
    let dir = scratch_dir("degraded");
    std::fs::write(dir.join("nt_nt_01.pdf"), background_pdf(595.28, 841.89)).unwrap();
    std::fs::write(dir.join("nt_nt_02.pdf"), b"%PDF-1.4\nbroken").unwrap();
    // Page 3 has no background at all
    std::fs::write(dir.join("seite3.txt"), record("qwe qe", "60, 100, 250, 112")).unwrap();

    let templates = TemplateSet::load_pages(&dir, 3).unwrap();
    let tail = background_pdf(595.28, 841.89);
    let pdf = generate_offer(&request(), &Settings::default(), &templates, Some(&tail)).unwrap();

    let doc = Document::load_mem(&pdf).unwrap();
    assert_eq!(doc.get_pages().len(), 4);
    let page3 = page_text(&doc, doc.get_pages()[&3]);
    assert!(page3.contains("(Max Mustermann) Tj"), "{page3}");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_footer_counts_tail_pages() {
    let elements = coords::parse(&record("1", "540, 790, 560, 800").replace("Color: 0", "Color: 0xFFFFFF"));
    let templates = TemplateSet::new(vec![PageSpec {
        background: Some(background_pdf(595.28, 841.89)),
        secondary: None,
        elements,
    }]);
    let tail = {
        let one = background_pdf(595.28, 841.89);
        composite(&[one.clone(), one], &[], None).unwrap()
    };

    assert_eq!(total_page_count(&templates, Some(&tail)), 3);
    let pdf = generate_offer(&request(), &Settings::default(), &templates, Some(&tail)).unwrap();
    let doc = Document::load_mem(&pdf).unwrap();
    assert_eq!(doc.get_pages().len(), 3);
    let page1 = page_text(&doc, doc.get_pages()[&1]);
    assert!(page1.contains("(Seite 1 von 3) Tj"), "{page1}");
}

#[test]
fn test_unmapped_literal_drawn_verbatim() {
    let data = offer_template::resolve(&request(), &Settings::default(), 7);
    let elements = coords::parse(&record("Ihr Angebot", "60, 100, 250, 112"));

    let overlay = OverlayRenderer::new()
        .render_page(2, &elements, &data, &Settings::default(), 7, None)
        .unwrap();
    let doc = Document::load_mem(&overlay).unwrap();
    let page_id = doc.get_pages()[&1];
    let content = String::from_utf8_lossy(&doc.get_page_content(page_id).unwrap()).to_string();
    assert!(content.contains("(Ihr Angebot) Tj"), "{content}");
}

#[test]
fn test_y_axis_inverted() {
    let data = offer_template::resolve(&request(), &Settings::default(), 7);
    let elements = coords::parse(&record("qwe qe", "60, 100, 250, 112"));

    let overlay = OverlayRenderer::new()
        .render_page(2, &elements, &data, &Settings::default(), 7, Some((600.0, 800.0)))
        .unwrap();
    let doc = Document::load_mem(&overlay).unwrap();
    let page_id = doc.get_pages()[&1];
    let content = String::from_utf8_lossy(&doc.get_page_content(page_id).unwrap()).to_string();
    // 800 - 112
    assert!(content.contains("60 688 Td"), "{content}");
}

#[test]
fn test_missing_template_dir_is_an_error() {
    let result = TemplateSet::load("/definitely/not/here");
    assert!(matches!(result, Err(TemplateError::IoError(_))));
}
