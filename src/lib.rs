//! # pdf2docling
//!
//! Convert PDF and image files to DocTags and Markdown using a
//! vision-to-text document model.
//!
//! ## How it works
//!
//! Each PDF page is rasterised to a bitmap whose longest side is a fixed
//! pixel count, handed to a docling-style vision model with the instruction
//! "Convert this page to docling.", and the resulting DocTags markup is
//! exported as Markdown. Rasterisation runs through the poppler command-line
//! tools rather than an in-process PDF engine: `pdfinfo` supplies each
//! page's physical MediaBox dimensions, from which the rendering DPI is
//! derived (`target_px * 72 / longest_pt`, 72 points per inch), and
//! `pdftoppm` renders exactly that page to PNG on stdout.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF / JPG / PNG
//!  │
//!  ├─ 1. Input       validate path, extension, and PDF magic
//!  ├─ 2. Geometry    per-page MediaBox dimensions via pdfinfo
//!  ├─ 3. Render      resolution-correct rasterisation via pdftoppm
//!  ├─ 4. Transcribe  one vision-model call per page → DocTags
//!  ├─ 5. Cleanup     strip chat artefacts from the raw markup
//!  └─ 6. Export      DocTags → Markdown, pages assembled in order
//! ```
//!
//! Pages are processed strictly sequentially in ascending order, and the
//! pipeline is fail-fast: the first error on any page aborts the run.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2docling::{convert, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder()
//!         .endpoint("http://localhost:8000/v1")
//!         .model("ds4sd/SmolDocling-256M-preview")
//!         .build()?;
//!     let output = convert("document.pdf", &config).await?;
//!     println!("{}", output.markdown);
//!     Ok(())
//! }
//! ```
//!
//! ## Requirements
//!
//! The poppler utilities (`pdfinfo`, `pdftoppm`) must be on `PATH` for PDF
//! inputs: `apt install poppler-utils` / `brew install poppler`. Image
//! inputs (JPG/PNG) are decoded in-process and need no external tools.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2docling` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod doctags;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ConversionConfig, ConversionConfigBuilder, Device, PageSelection, PageSeparator,
    DEFAULT_TARGET_DIM,
};
pub use convert::{convert, convert_from_bytes, convert_sync, convert_to_file, inspect};
pub use doctags::export_to_markdown;
pub use error::Pdf2DoclingError;
pub use output::{ConversionOutput, ConversionStats, DocumentMetadata, PageResult};
pub use pipeline::geometry::{get_page_dimensions, PageGeometry};
pub use pipeline::render::render_page;
pub use pipeline::transcribe::{HttpTranscriber, PageTranscriber};
pub use progress::{ConversionProgressCallback, ProgressCallback};
