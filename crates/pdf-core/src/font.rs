//! Font handling: PDF standard fonts with built-in metrics and embedded TrueType fonts

use crate::{PdfError, Result};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::BTreeSet;

/// Width used for characters missing from a metrics table (1/1000 em)
const DEFAULT_WIDTH: u16 = 556;

/// Helvetica advance widths for U+0020..=U+007E (1/1000 em)
const HELVETICA_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 0..?
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // @..O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // P.._
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // `..o
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // p..~
];

/// Helvetica-Bold advance widths for U+0020..=U+007E (1/1000 em)
const HELVETICA_BOLD_ASCII: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, // 0..?
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, // @..O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, // P.._
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, // `..o
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, // p..~
];

/// Widths of the non-ASCII characters offer documents use: (char, regular, bold)
const HELVETICA_EXTRA: [(char, u16, u16); 22] = [
    ('Ä', 667, 722),
    ('Ö', 778, 778),
    ('Ü', 722, 722),
    ('ä', 556, 556),
    ('ö', 556, 611),
    ('ü', 556, 611),
    ('ß', 611, 611),
    ('é', 556, 556),
    ('è', 556, 556),
    ('€', 556, 556),
    ('°', 400, 400),
    ('–', 556, 556),
    ('—', 1000, 1000),
    ('•', 350, 350),
    ('×', 584, 584),
    ('²', 333, 333),
    ('³', 333, 333),
    ('µ', 556, 611),
    ('§', 556, 556),
    ('©', 737, 737),
    ('®', 737, 737),
    ('\u{a0}', 278, 278),
];

/// The PDF base-14 fonts offer templates refer to
///
/// These need no embedding; every conforming viewer ships them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
    Courier,
    CourierBold,
}

impl StandardFont {
    /// Look up a standard font by its PostScript name
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "Helvetica" => Some(Self::Helvetica),
            "Helvetica-Bold" => Some(Self::HelveticaBold),
            "Helvetica-Oblique" => Some(Self::HelveticaOblique),
            "Helvetica-BoldOblique" => Some(Self::HelveticaBoldOblique),
            "Courier" => Some(Self::Courier),
            "Courier-Bold" => Some(Self::CourierBold),
            _ => None,
        }
    }

    /// Closest standard substitute for an unknown font name
    ///
    /// Names that look bold map to Helvetica-Bold, everything else to Helvetica.
    pub fn substitute_for(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        if lower.contains("bold") || lower.contains("black") || lower.contains("heavy") {
            Self::HelveticaBold
        } else {
            Self::Helvetica
        }
    }

    /// PostScript base font name
    pub fn base_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::HelveticaOblique => "Helvetica-Oblique",
            Self::HelveticaBoldOblique => "Helvetica-BoldOblique",
            Self::Courier => "Courier",
            Self::CourierBold => "Courier-Bold",
        }
    }

    fn is_bold(&self) -> bool {
        matches!(
            self,
            Self::HelveticaBold | Self::HelveticaBoldOblique | Self::CourierBold
        )
    }

    /// Advance width of a character in 1/1000 em
    pub fn char_width(&self, c: char) -> u16 {
        if matches!(self, Self::Courier | Self::CourierBold) {
            return 600;
        }

        let code = c as u32;
        if (0x20..=0x7E).contains(&code) {
            let idx = (code - 0x20) as usize;
            return if self.is_bold() {
                HELVETICA_BOLD_ASCII[idx]
            } else {
                HELVETICA_ASCII[idx]
            };
        }

        HELVETICA_EXTRA
            .iter()
            .find(|(ch, _, _)| *ch == c)
            .map(|(_, regular, bold)| if self.is_bold() { *bold } else { *regular })
            .unwrap_or(DEFAULT_WIDTH)
    }

    /// Text width in points at the given size
    pub fn text_width_points(&self, text: &str, font_size: f32) -> f64 {
        let units: u32 = text.chars().map(|c| self.char_width(c) as u32).sum();
        units as f64 / 1000.0 * font_size as f64
    }

    /// Font dictionary for a Type1 standard font with WinAnsi encoding
    pub fn to_pdf_dictionary(&self) -> Dictionary {
        Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"Type1".to_vec())),
            ("BaseFont", Object::Name(self.base_name().as_bytes().to_vec())),
            ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
        ])
    }
}

/// Encode text in WinAnsiEncoding
///
/// Characters outside the code page become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| {
            let code = c as u32;
            match code {
                0x20..=0x7E | 0xA0..=0xFF => code as u8,
                _ => match c {
                    '€' => 0x80,
                    '‚' => 0x82,
                    'ƒ' => 0x83,
                    '„' => 0x84,
                    '…' => 0x85,
                    '†' => 0x86,
                    '‡' => 0x87,
                    '‰' => 0x89,
                    'Š' => 0x8A,
                    '‹' => 0x8B,
                    'Œ' => 0x8C,
                    'Ž' => 0x8E,
                    '‘' => 0x91,
                    '’' => 0x92,
                    '“' => 0x93,
                    '”' => 0x94,
                    '•' => 0x95,
                    '–' => 0x96,
                    '—' => 0x97,
                    '™' => 0x99,
                    'š' => 0x9A,
                    '›' => 0x9B,
                    'œ' => 0x9C,
                    'ž' => 0x9E,
                    'Ÿ' => 0x9F,
                    _ => b'?',
                },
            }
        })
        .collect()
}

/// An embedded TrueType font
///
/// The whole font program is embedded (no subsetting) and text is written
/// as 2-byte glyph IDs with the Identity-H encoding.
#[derive(Debug, Clone)]
pub struct FontData {
    /// Font name/identifier
    pub name: String,
    /// Raw TTF data
    pub ttf_data: Vec<u8>,
    /// Characters drawn so far (for /W and ToUnicode)
    pub used_chars: BTreeSet<char>,
}

impl FontData {
    /// Create font data from TTF bytes
    ///
    /// # Arguments
    /// * `name` - Font identifier
    /// * `ttf_data` - TrueType font file bytes
    pub fn from_ttf(name: &str, ttf_data: &[u8]) -> Result<Self> {
        ttf_parser::Face::parse(ttf_data, 0)
            .map_err(|e| PdfError::FontParseError(format!("{name}: {e:?}")))?;

        Ok(Self {
            name: name.to_string(),
            ttf_data: ttf_data.to_vec(),
            used_chars: BTreeSet::new(),
        })
    }

    fn face(&self) -> Option<ttf_parser::Face<'_>> {
        ttf_parser::Face::parse(&self.ttf_data, 0).ok()
    }

    /// Add characters to the used set
    pub fn add_chars(&mut self, text: &str) {
        self.used_chars.extend(text.chars());
    }

    /// Get font units per em
    pub fn units_per_em(&self) -> u16 {
        self.face().map(|face| face.units_per_em()).unwrap_or(1000)
    }

    /// Calculate text width in points for a given font size
    pub fn text_width_points(&self, text: &str, font_size: f32) -> f64 {
        let Some(face) = self.face() else {
            return 0.0;
        };
        let units: u32 = text
            .chars()
            .filter_map(|c| face.glyph_index(c))
            .filter_map(|gid| face.glyph_hor_advance(gid))
            .map(|w| w as u32)
            .sum();
        units as f64 / face.units_per_em() as f64 * font_size as f64
    }

    /// Encode text as a hex string of glyph IDs for the Tj operator
    pub fn encode_text_hex(&self, text: &str) -> String {
        let face = self.face();
        let mut result = String::with_capacity(text.len() * 4 + 2);
        result.push('<');
        for c in text.chars() {
            let gid = face
                .as_ref()
                .and_then(|f| f.glyph_index(c))
                .map(|g| g.0)
                .unwrap_or(0);
            result.push_str(&format!("{gid:04X}"));
        }
        result.push('>');
        result
    }

    /// Write the font program and dictionaries into a document
    ///
    /// # Returns
    /// Object ID of the Type0 font dictionary
    pub fn embed(&self, doc: &mut Document) -> Result<ObjectId> {
        let face = self
            .face()
            .ok_or_else(|| PdfError::FontParseError(self.name.clone()))?;

        let base_font = Object::Name(self.name.replace(' ', "").into_bytes());
        let scale = 1000.0 / face.units_per_em() as f64;
        let to_pdf_units = |v: i16| (v as f64 * scale).round() as i64;

        let font_file_id = doc.add_object(Stream::new(
            Dictionary::from_iter(vec![("Length1", Object::Integer(self.ttf_data.len() as i64))]),
            self.ttf_data.clone(),
        ));

        let bbox = face.global_bounding_box();
        let descriptor_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"FontDescriptor".to_vec())),
            ("FontName", base_font.clone()),
            ("Flags", Object::Integer(4)),
            (
                "FontBBox",
                Object::Array(vec![
                    to_pdf_units(bbox.x_min).into(),
                    to_pdf_units(bbox.y_min).into(),
                    to_pdf_units(bbox.x_max).into(),
                    to_pdf_units(bbox.y_max).into(),
                ]),
            ),
            ("ItalicAngle", Object::Integer(0)),
            ("Ascent", to_pdf_units(face.ascender()).into()),
            ("Descent", to_pdf_units(face.descender()).into()),
            ("CapHeight", to_pdf_units(face.ascender()).into()),
            ("StemV", Object::Integer(80)),
            ("FontFile2", Object::Reference(font_file_id)),
        ]));

        let mut widths = Vec::new();
        let mut gids: Vec<u16> = self
            .used_chars
            .iter()
            .filter_map(|c| face.glyph_index(*c).map(|g| g.0))
            .collect();
        gids.sort_unstable();
        gids.dedup();
        for gid in gids {
            let advance = face
                .glyph_hor_advance(ttf_parser::GlyphId(gid))
                .unwrap_or(0);
            widths.push(Object::Integer(gid as i64));
            widths.push(Object::Array(vec![Object::Integer(
                (advance as f64 * scale).round() as i64,
            )]));
        }

        let cid_font_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"CIDFontType2".to_vec())),
            ("BaseFont", base_font.clone()),
            (
                "CIDSystemInfo",
                Object::Dictionary(Dictionary::from_iter(vec![
                    ("Registry", Object::string_literal("Adobe")),
                    ("Ordering", Object::string_literal("Identity")),
                    ("Supplement", Object::Integer(0)),
                ])),
            ),
            ("FontDescriptor", Object::Reference(descriptor_id)),
            ("W", Object::Array(widths)),
            ("DW", Object::Integer(1000)),
            ("CIDToGIDMap", Object::Name(b"Identity".to_vec())),
        ]));

        let cmap = self.generate_tounicode_cmap(&face);
        let tounicode_id = doc.add_object(Stream::new(Dictionary::new(), cmap.into_bytes()));

        Ok(doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"Type0".to_vec())),
            ("BaseFont", base_font),
            ("Encoding", Object::Name(b"Identity-H".to_vec())),
            (
                "DescendantFonts",
                Object::Array(vec![Object::Reference(cid_font_id)]),
            ),
            ("ToUnicode", Object::Reference(tounicode_id)),
        ])))
    }

    /// ToUnicode CMap mapping the used glyph IDs back to text
    fn generate_tounicode_cmap(&self, face: &ttf_parser::Face<'_>) -> String {
        let mut cmap = String::new();
        cmap.push_str("/CIDInit /ProcSet findresource begin\n12 dict begin\nbegincmap\n");
        cmap.push_str("/CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n");
        cmap.push_str("/CMapName /Adobe-Identity-UCS def\n/CMapType 2 def\n");
        cmap.push_str("1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n");

        let pairs: Vec<(u16, char)> = self
            .used_chars
            .iter()
            .filter_map(|c| face.glyph_index(*c).map(|g| (g.0, *c)))
            .collect();

        for chunk in pairs.chunks(100) {
            cmap.push_str(&format!("{} beginbfchar\n", chunk.len()));
            for (gid, c) in chunk {
                let mut utf16 = [0u16; 2];
                let units: String = c
                    .encode_utf16(&mut utf16)
                    .iter()
                    .map(|u| format!("{u:04X}"))
                    .collect();
                cmap.push_str(&format!("<{gid:04X}> <{units}>\n"));
            }
            cmap.push_str("endbfchar\n");
        }

        cmap.push_str("endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");
        cmap
    }
}

/// A font selected for drawing
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FontRef {
    /// Base-14 font
    Standard(StandardFont),
    /// A registered TrueType font, by registration name
    Embedded(String),
}
