//! Output types: per-page results, document metadata, and run statistics.

use serde::{Deserialize, Serialize};

/// The result of a full document conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// The assembled Markdown document.
    pub markdown: String,
    /// Per-page results in ascending page order.
    pub pages: Vec<PageResult>,
    /// Document metadata (page count, title, …).
    pub metadata: DocumentMetadata,
    /// Timing and page-count statistics for the run.
    pub stats: ConversionStats,
}

/// One converted page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    /// 1-indexed page number. Always 1 for image inputs.
    pub page_num: usize,
    /// Raw DocTags markup as produced by the model (after cleanup).
    pub doctags: String,
    /// Markdown exported from the DocTags markup.
    pub markdown: String,
    /// Wall-clock duration of rendering this page, in milliseconds.
    /// Zero for image inputs (no rasterisation step).
    pub render_ms: u64,
    /// Wall-clock duration of the model call, in milliseconds.
    pub inference_ms: u64,
}

/// Document metadata parsed from `pdfinfo` output.
///
/// For image inputs only `page_count` (= 1) is populated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    /// Total number of pages in the document.
    pub page_count: usize,
    /// PDF specification version, e.g. "1.7". Empty for image inputs.
    pub pdf_version: String,
    /// Whether the document reports itself as encrypted.
    pub encrypted: bool,
}

/// Timing and page-count statistics for a conversion run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Total pages in the source document.
    pub total_pages: usize,
    /// Pages actually converted (after page selection).
    pub processed_pages: usize,
    /// Total time spent rasterising, in milliseconds.
    pub render_duration_ms: u64,
    /// Total time spent in model calls, in milliseconds.
    pub inference_duration_ms: u64,
    /// End-to-end wall-clock duration, in milliseconds.
    pub total_duration_ms: u64,
}
