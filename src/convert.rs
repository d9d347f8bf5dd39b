//! Full-document conversion entry points.
//!
//! The driver is strictly sequential: pages are rendered, transcribed, and
//! exported one at a time in ascending page order, and the first error on
//! any page aborts the whole conversion. Each page's geometry query and
//! render are independent requests against the external tools — no state is
//! carried between pages.

use crate::config::ConversionConfig;
use crate::doctags;
use crate::error::Pdf2DoclingError;
use crate::output::{ConversionOutput, ConversionStats, DocumentMetadata, PageResult};
use crate::pipeline::transcribe::{resolve_transcriber, PageTranscriber};
use crate::pipeline::{geometry, input, postprocess, render};
use image::DynamicImage;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Convert a PDF or image file to DocTags and Markdown.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input_str` — path to a PDF, JPG, or PNG file
/// * `config` — conversion configuration
///
/// # Errors
/// Fail-fast: any input, rendering, or transcription error aborts the
/// conversion and is returned. There is no partial output.
pub async fn convert(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2DoclingError> {
    let total_start = Instant::now();
    let input_str = input_str.as_ref();
    info!("Starting conversion: {}", input_str);

    // ── Step 1: Resolve and classify the input ───────────────────────────
    let resolved = input::resolve_input(input_str)?;

    // ── Step 2: Resolve the vision-model backend ─────────────────────────
    let transcriber = resolve_transcriber(config)?;

    // ── Step 3: Convert ──────────────────────────────────────────────────
    let (metadata, pages) = match &resolved {
        input::InputKind::Pdf(path) => convert_pdf(path, config, &transcriber).await?,
        input::InputKind::Image(path) => convert_image(path, config, &transcriber).await?,
    };

    // ── Step 4: Assemble the Markdown document ───────────────────────────
    let markdown = assemble_document(&pages, config);

    // ── Step 5: Stats ────────────────────────────────────────────────────
    let stats = ConversionStats {
        total_pages: metadata.page_count,
        processed_pages: pages.len(),
        render_duration_ms: pages.iter().map(|p| p.render_ms).sum(),
        inference_duration_ms: pages.iter().map(|p| p.inference_ms).sum(),
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Conversion complete: {}/{} pages, {}ms total",
        stats.processed_pages, stats.total_pages, stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(stats.processed_pages);
    }

    Ok(ConversionOutput {
        markdown,
        pages,
        metadata,
        stats,
    })
}

/// Convert a document and write the Markdown directly to a file.
///
/// Uses an atomic write (temp file + rename) to prevent partial files.
pub async fn convert_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionStats, Pdf2DoclingError> {
    let output = convert(input_str, config).await?;
    let path = output_path.as_ref();

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| Pdf2DoclingError::OutputWrite {
                path: path.to_path_buf(),
                source: e,
            })?;
    }

    let tmp_path = path.with_extension("md.tmp");
    tokio::fs::write(&tmp_path, &output.markdown)
        .await
        .map_err(|e| Pdf2DoclingError::OutputWrite {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Pdf2DoclingError::OutputWrite {
            path: path.to_path_buf(),
            source: e,
        })?;

    Ok(output.stats)
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2DoclingError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2DoclingError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(convert(input_str, config))
}

/// Convert PDF bytes in memory.
///
/// Writes `bytes` to a managed temp file (the external tools need a path)
/// and cleans it up automatically on return or panic.
pub async fn convert_from_bytes(
    bytes: &[u8],
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2DoclingError> {
    let mut tmp = tempfile::Builder::new()
        .suffix(".pdf")
        .tempfile()
        .map_err(|e| Pdf2DoclingError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| Pdf2DoclingError::Internal(format!("tempfile write: {e}")))?;
    let path = tmp.path().to_string_lossy().to_string();
    // `tmp` is dropped (and the file deleted) when `convert` returns.
    convert(&path, config).await
}

/// Read document metadata without converting content.
///
/// Does not require a vision-model backend.
pub async fn inspect(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<DocumentMetadata, Pdf2DoclingError> {
    match input::resolve_input(input_str.as_ref())? {
        input::InputKind::Pdf(path) => geometry::read_document_metadata(config, &path).await,
        input::InputKind::Image(_) => Ok(DocumentMetadata {
            page_count: 1,
            ..Default::default()
        }),
    }
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn convert_pdf(
    path: &Path,
    config: &ConversionConfig,
    transcriber: &Arc<dyn PageTranscriber>,
) -> Result<(DocumentMetadata, Vec<PageResult>), Pdf2DoclingError> {
    let metadata = geometry::read_document_metadata(config, path).await?;
    let total = metadata.page_count;
    info!("PDF has {} pages", total);

    let page_numbers = config.pages.to_page_numbers(total);
    if page_numbers.is_empty() {
        return Err(Pdf2DoclingError::PageOutOfRange {
            page: first_requested_page(config),
            total,
        });
    }
    debug!("Selected {} pages for conversion", page_numbers.len());

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(page_numbers.len());
    }

    let mut pages = Vec::with_capacity(page_numbers.len());
    for &page_num in &page_numbers {
        if let Some(ref cb) = config.progress_callback {
            cb.on_page_start(page_num, page_numbers.len());
        }

        let render_start = Instant::now();
        let image = render::render_page(config, path, page_num, config.target_longest_dim).await?;
        let render_ms = render_start.elapsed().as_millis() as u64;

        let result = process_page(page_num, &image, transcriber, render_ms).await?;

        if let Some(ref cb) = config.progress_callback {
            cb.on_page_complete(page_num, page_numbers.len(), result.markdown.len());
        }
        pages.push(result);
    }

    Ok((metadata, pages))
}

async fn convert_image(
    path: &Path,
    config: &ConversionConfig,
    transcriber: &Arc<dyn PageTranscriber>,
) -> Result<(DocumentMetadata, Vec<PageResult>), Pdf2DoclingError> {
    let image = image::open(path).map_err(|e| Pdf2DoclingError::Decode {
        page: 1,
        detail: e.to_string(),
    })?;

    let metadata = DocumentMetadata {
        page_count: 1,
        ..Default::default()
    };

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(1);
        cb.on_page_start(1, 1);
    }

    let result = process_page(1, &image, transcriber, 0).await?;

    if let Some(ref cb) = config.progress_callback {
        cb.on_page_complete(1, 1, result.markdown.len());
    }

    Ok((metadata, vec![result]))
}

/// Transcribe one rendered page and export its markup.
async fn process_page(
    page_num: usize,
    image: &DynamicImage,
    transcriber: &Arc<dyn PageTranscriber>,
    render_ms: u64,
) -> Result<PageResult, Pdf2DoclingError> {
    let inference_start = Instant::now();
    let raw = transcriber.transcribe(page_num, image).await?;
    let inference_ms = inference_start.elapsed().as_millis() as u64;

    let doctags = postprocess::clean_doctags(&raw);
    let markdown = doctags::export_to_markdown(&doctags);
    debug!(
        page_num,
        doctags_len = doctags.len(),
        markdown_len = markdown.len(),
        "page exported"
    );

    Ok(PageResult {
        page_num,
        doctags,
        markdown,
        render_ms,
        inference_ms,
    })
}

/// The page the user most plausibly asked for, for out-of-range reporting.
fn first_requested_page(config: &ConversionConfig) -> usize {
    use crate::config::PageSelection::*;
    match &config.pages {
        All => 1,
        Single(p) => *p,
        Range(s, _) => *s,
        Set(set) => set.iter().copied().min().unwrap_or(1),
    }
}

/// Assemble the final markdown document from page results.
fn assemble_document(pages: &[PageResult], config: &ConversionConfig) -> String {
    let mut parts: Vec<String> = Vec::new();

    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            parts.push(config.page_separator.render(page.page_num));
        }
        parts.push(page.markdown.clone());
    }

    let mut doc = parts.join("");
    if !doc.ends_with('\n') {
        doc.push('\n');
    }
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PageSeparator, PageSelection};

    fn page(n: usize, md: &str) -> PageResult {
        PageResult {
            page_num: n,
            doctags: String::new(),
            markdown: md.to_string(),
            render_ms: 0,
            inference_ms: 0,
        }
    }

    #[test]
    fn assemble_joins_with_separator() {
        let config = ConversionConfig::builder()
            .page_separator(PageSeparator::Comment)
            .build()
            .unwrap();
        let doc = assemble_document(&[page(1, "one"), page(2, "two")], &config);
        assert_eq!(doc, "one\n\n<!-- page 2 -->\n\ntwo\n");
    }

    #[test]
    fn assemble_ends_with_single_newline() {
        let config = ConversionConfig::default();
        let doc = assemble_document(&[page(1, "only")], &config);
        assert_eq!(doc, "only\n");
    }

    #[test]
    fn first_requested_page_by_selection() {
        let mut config = ConversionConfig::default();
        config.pages = PageSelection::Single(9);
        assert_eq!(first_requested_page(&config), 9);
        config.pages = PageSelection::Set(vec![7, 3, 5]);
        assert_eq!(first_requested_page(&config), 3);
        config.pages = PageSelection::All;
        assert_eq!(first_requested_page(&config), 1);
    }
}
