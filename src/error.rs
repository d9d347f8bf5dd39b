//! Error types for the pdf2docling library.
//!
//! The whole pipeline is fail-fast: there is no retry and no partial-success
//! bookkeeping. The first error on any page aborts the conversion and
//! surfaces here with the underlying diagnostic text attached (a failing
//! poppler tool's stderr, the byte prefix of a file that is not a PDF, and
//! so on), so the user sees *why* rather than just *that* it failed.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the pdf2docling library.
#[derive(Debug, Error)]
pub enum Pdf2DoclingError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file extension is not one of pdf, jpg, jpeg, png.
    #[error(
        "Unsupported file format '.{extension}' for '{path}'\n\
         Provide a PDF, JPG, or PNG file."
    )]
    UnsupportedFormat { path: PathBuf, extension: String },

    /// The file has a `.pdf` extension but does not start with `%PDF`.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── External tool errors ──────────────────────────────────────────────
    /// An external poppler tool exited with a non-zero status.
    ///
    /// `status` is `None` when the process was killed by a signal.
    #[error(
        "{tool} exited with status {status:?}: {stderr}\n\
         Ensure poppler-utils is installed (apt install poppler-utils)."
    )]
    ExternalTool {
        tool: String,
        status: Option<i32>,
        stderr: String,
    },

    /// The page-info output contained no MediaBox record.
    #[error("MediaBox not found in pdfinfo output for page {page} of '{path}'")]
    GeometryNotFound { path: PathBuf, page: usize },

    /// A page declared a zero or negative physical dimension.
    #[error("Page {page} has invalid dimensions {width}x{height} pt (must be positive)")]
    InvalidGeometry {
        page: usize,
        width: f64,
        height: f64,
    },

    /// Requested page number exceeds the actual page count.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    /// The rasteriser did not finish within the fixed deadline.
    #[error("Rendering page {page} timed out after {secs}s")]
    RenderTimeout { page: usize, secs: u64 },

    /// The rasteriser's stdout was not a decodable image.
    #[error("Page {page}: rasteriser output is not a valid image: {detail}")]
    Decode { page: usize, detail: String },

    // ── Inference errors ──────────────────────────────────────────────────
    /// The vision-to-text backend failed for a page.
    #[error("Page {page}: transcription failed: {detail}")]
    Transcription { page: usize, detail: String },

    /// No inference backend is configured and none could be derived.
    #[error("No vision-model backend configured.\n{hint}")]
    BackendNotConfigured { hint: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}
