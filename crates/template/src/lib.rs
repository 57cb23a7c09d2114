//! Offer Template - coordinate-driven overlay engine for PV offer PDFs
//!
//! This crate provides:
//! - Coordinate descriptor parsing (`seiteN.yml`)
//! - The placeholder token table and dynamic data resolution
//! - Per-page overlay rules (KPI donuts, cost chart, logos, masking)
//! - Compositing overlays onto template backgrounds and appending tail documents
//!
//! # Example
//!
//! ```ignore
//! use offer_template::{generate_offer, GenerationRequest, Settings, TemplateSet};
//!
//! let templates = TemplateSet::load("templates/")?;
//! let request = GenerationRequest::from_json(request_json)?;
//! let pdf = generate_offer(&request, &Settings::default(), &templates, None)?;
//! std::fs::write("angebot.pdf", pdf)?;
//! ```

pub mod blocks;
pub mod coords;
pub mod resolver;
pub mod token;
mod compositor;
mod generate;
mod renderer;
mod rules;
mod settings;

pub use compositor::{composite, PageSpec, TemplateSet, DEFAULT_PAGE_COUNT};
pub use coords::{DrawElement, Rect};
pub use generate::{generate_offer, total_page_count};
pub use renderer::{load_font_dir, FontFile, OverlayRenderer};
pub use resolver::{resolve, resolve_on, DynamicData, GenerationRequest};
pub use rules::{PageRule, RuleRegistry};
pub use settings::{FeedInTariffs, Settings, TariffBand, WatermarkSettings};
pub use token::{Token, TokenMap};

use thiserror::Error;

/// Errors that can occur during offer generation
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Failed to parse input: {0}")]
    ParseError(String),

    #[error("Render error: {0}")]
    RenderError(String),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("Unsupported image format: {0}")]
    UnsupportedImage(String),

    #[error("Nothing to render: no template backgrounds and no overlay content")]
    NothingToRender,

    #[error("PDF error: {0}")]
    PdfError(#[from] pdf_core::PdfError),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for template operations
pub type Result<T> = std::result::Result<T, TemplateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_from_pdf_error() {
        let err: TemplateError = pdf_core::PdfError::InvalidPage(2, 1).into();
        assert!(err.to_string().starts_with("PDF error: Invalid page number: 2"));
    }
}
