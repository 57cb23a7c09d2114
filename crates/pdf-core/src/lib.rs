//! PDF Core - Low-level PDF drawing and compositing
//!
//! This crate provides functionality for:
//! - Drawing text, shapes and images onto a single-page overlay canvas
//! - PDF base-14 fonts with built-in metrics, and embedded TrueType fonts
//! - Embedding raster images (JPEG, PNG with transparency)
//! - Stamping pages of existing PDFs onto new pages and appending documents
//!
//! # Example
//!
//! ```ignore
//! use pdf_core::{Align, Canvas, Color, DocumentBuilder, Layer};
//!
//! let mut canvas = Canvas::a4();
//! canvas.draw_text("Max Mustermann", 70.0, 700.0, Align::Left, "Helvetica", 10.0, Color::black());
//! let overlay = canvas.finish()?;
//!
//! let mut builder = DocumentBuilder::new();
//! builder.add_layered_page(&[Layer::full_page(&background), Layer::full_page(&overlay)], None)?;
//! std::fs::write("offer.pdf", builder.finish()?)?;
//! ```

mod canvas;
mod compose;
mod font;
mod image;
mod text;

pub use canvas::{Canvas, Color, A4_HEIGHT, A4_WIDTH};
pub use compose::{load_pdf, page_count, page_size, DocumentBuilder, Layer};
pub use font::{encode_win_ansi, FontData, FontRef, StandardFont};
pub use image::{calculate_scaled_dimensions, detect_format, ImageFormat, ImageScaleMode};
pub use text::{calculate_x_offset, generate_text_operators, TextRenderContext};

use thiserror::Error;

/// Errors that can occur during PDF operations
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Failed to open PDF: {0}")]
    OpenError(String),

    #[error("Failed to save PDF: {0}")]
    SaveError(String),

    #[error("Font not found: {0}")]
    FontNotFound(String),

    #[error("Failed to parse font: {0}")]
    FontParseError(String),

    #[error("Invalid page number: {0} (document has {1} pages)")]
    InvalidPage(usize, usize),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("PDF parsing error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Lopdf error: {0}")]
    LopdfError(#[from] lopdf::Error),
}

/// Result type for PDF operations
pub type Result<T> = std::result::Result<T, PdfError>;

/// Text alignment options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}
