//! Offer CLI
//!
//! Renders a PV offer from a template directory and a JSON request.
//!
//! ## Usage
//!
//! ```bash
//! offer-cli --templates templates/ --request request.json --output angebot.pdf
//!
//! # With settings and a product datasheet appended
//! offer-cli --templates templates/ --request request.json \
//!     --settings settings.json --tail datenblatt.pdf --output angebot.pdf -v
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use offer_template::{generate_offer, GenerationRequest, Settings, TemplateSet};
use std::path::{Path, PathBuf};

/// Render a PV offer PDF from template backgrounds and customer data
#[derive(Parser, Debug)]
#[command(name = "offer-cli")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory with nt_nt_NN.pdf backgrounds and seiteN.yml coordinate files
    #[arg(long, value_name = "DIR")]
    templates: PathBuf,

    /// Generation request JSON with customer, company, results and project
    #[arg(long, value_name = "FILE")]
    request: PathBuf,

    /// Settings JSON; defaults apply when omitted
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// PDF appended after the template pages
    #[arg(long, value_name = "FILE")]
    tail: Option<PathBuf>,

    /// Output PDF path
    #[arg(long, short, value_name = "FILE")]
    output: PathBuf,

    /// Log debug output (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let request_json = std::fs::read_to_string(&cli.request)
        .with_context(|| format!("Failed to read request '{}'", cli.request.display()))?;
    let request = GenerationRequest::from_json(&request_json)
        .with_context(|| format!("Invalid request '{}'", cli.request.display()))?;

    let settings = match &cli.settings {
        Some(path) => Settings::from_file(path)
            .with_context(|| format!("Failed to load settings '{}'", path.display()))?,
        None => Settings::default(),
    };

    let templates = TemplateSet::load(&cli.templates)
        .with_context(|| format!("Failed to load templates from '{}'", cli.templates.display()))?;

    let tail = cli
        .tail
        .as_ref()
        .map(|path| {
            std::fs::read(path).with_context(|| format!("Failed to read tail '{}'", path.display()))
        })
        .transpose()?;

    let pdf = generate_offer(&request, &settings, &templates, tail.as_deref())
        .context("Offer generation failed")?;

    write_output(&cli.output, &pdf)?;
    log::info!("wrote {} ({} bytes)", cli.output.display(), pdf.len());
    Ok(())
}

fn write_output(path: &Path, pdf: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create '{}'", parent.display()))?;
    }
    std::fs::write(path, pdf).with_context(|| format!("Failed to write '{}'", path.display()))
}
