//! Page geometry and document metadata via `pdfinfo`.
//!
//! A PDF page's physical size lives in its MediaBox: four coordinates
//! `(x0, y0, x1, y1)` in points (1/72 inch). `pdfinfo -box` prints them per
//! page; we scope the query to exactly the requested page with `-f`/`-l` and
//! scan the output for the MediaBox record. The parsing itself is a pure
//! function so it is tested without spawning anything.
//!
//! Geometry is derived fresh on every query and never cached: the query is
//! cheap next to rasterisation and inference, and caching would be one more
//! piece of state to invalidate.

use crate::config::ConversionConfig;
use crate::error::Pdf2DoclingError;
use crate::output::DocumentMetadata;
use crate::pipeline::exec::{self, ExecError};
use std::path::Path;
use tracing::debug;

/// Physical page dimensions in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f64,
    pub height: f64,
}

impl PageGeometry {
    /// The larger of width and height, used to normalise rendered image
    /// size across portrait and landscape pages.
    pub fn longest(&self) -> f64 {
        self.width.max(self.height)
    }
}

/// Get the MediaBox dimensions for one page of a PDF.
///
/// Invokes `pdfinfo -f N -l N -box -enc UTF-8 <path>` and parses the
/// MediaBox record. `page` is 1-indexed.
///
/// # Errors
/// * [`Pdf2DoclingError::ExternalTool`] — pdfinfo exited non-zero (its
///   stderr is attached) or could not be run
/// * [`Pdf2DoclingError::GeometryNotFound`] — no MediaBox record in the output
/// * [`Pdf2DoclingError::InvalidGeometry`] — a non-positive dimension
pub async fn get_page_dimensions(
    config: &ConversionConfig,
    pdf_path: &Path,
    page: usize,
) -> Result<PageGeometry, Pdf2DoclingError> {
    let page_arg = page.to_string();
    let args = [
        "-f",
        &page_arg,
        "-l",
        &page_arg,
        "-box",
        "-enc",
        "UTF-8",
    ];

    let output = exec::run_tool(
        &config.pdfinfo_bin,
        args.iter()
            .map(|s| s.to_string())
            .chain([pdf_path.display().to_string()]),
        config.render_timeout_secs,
    )
    .await
    .map_err(|e| map_exec_error(&config.pdfinfo_bin, e))?;

    let text = String::from_utf8_lossy(&output.stdout);
    let (width, height) =
        parse_media_box(&text).ok_or_else(|| Pdf2DoclingError::GeometryNotFound {
            path: pdf_path.to_path_buf(),
            page,
        })?;

    if width <= 0.0 || height <= 0.0 {
        return Err(Pdf2DoclingError::InvalidGeometry {
            page,
            width,
            height,
        });
    }

    debug!(page, width, height, "MediaBox dimensions");
    Ok(PageGeometry { width, height })
}

/// Read document-level metadata (page count, title, …) via plain `pdfinfo`.
pub async fn read_document_metadata(
    config: &ConversionConfig,
    pdf_path: &Path,
) -> Result<DocumentMetadata, Pdf2DoclingError> {
    let output = exec::run_tool(
        &config.pdfinfo_bin,
        ["-enc".to_string(), "UTF-8".to_string(), pdf_path.display().to_string()],
        config.render_timeout_secs,
    )
    .await
    .map_err(|e| map_exec_error(&config.pdfinfo_bin, e))?;

    let text = String::from_utf8_lossy(&output.stdout);
    let metadata = parse_pdfinfo(&text);

    if metadata.page_count == 0 {
        return Err(Pdf2DoclingError::Internal(format!(
            "pdfinfo reported no pages for '{}'",
            pdf_path.display()
        )));
    }

    Ok(metadata)
}

/// Map an [`ExecError`] onto the domain error. Used by both pdfinfo queries.
fn map_exec_error(tool: &str, e: ExecError) -> Pdf2DoclingError {
    match e {
        ExecError::Spawn { source, .. } => Pdf2DoclingError::ExternalTool {
            tool: tool.to_string(),
            status: None,
            stderr: format!("could not be started: {source}"),
        },
        ExecError::NonZero { status, stderr, .. } => Pdf2DoclingError::ExternalTool {
            tool: tool.to_string(),
            status,
            stderr,
        },
        ExecError::TimedOut { secs, .. } => Pdf2DoclingError::ExternalTool {
            tool: tool.to_string(),
            status: None,
            stderr: format!("timed out after {secs}s"),
        },
    }
}

// ── Pure parsers ─────────────────────────────────────────────────────────

/// Scan `pdfinfo -box` output for the first MediaBox record and return
/// `(|x1 - x0|, |y1 - y0|)`.
///
/// Expected line shape:
/// `Page    1 MediaBox:     0.00     0.00   612.00   792.00`
pub fn parse_media_box(output: &str) -> Option<(f64, f64)> {
    for line in output.lines() {
        if !line.contains("MediaBox") {
            continue;
        }
        let (_, coords) = line.split_once(':')?;
        let nums: Vec<f64> = coords
            .split_whitespace()
            .filter_map(|t| t.parse().ok())
            .collect();
        if nums.len() < 4 {
            return None;
        }
        return Some(((nums[0] - nums[2]).abs(), (nums[3] - nums[1]).abs()));
    }
    None
}

/// Parse plain `pdfinfo` output into [`DocumentMetadata`].
///
/// Unrecognised lines are ignored; missing fields stay `None`/default.
pub fn parse_pdfinfo(output: &str) -> DocumentMetadata {
    let mut meta = DocumentMetadata::default();

    for line in output.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        match key.trim() {
            "Title" => meta.title = Some(value.to_string()),
            "Author" => meta.author = Some(value.to_string()),
            "Creator" => meta.creator = Some(value.to_string()),
            "Producer" => meta.producer = Some(value.to_string()),
            "Pages" => meta.page_count = value.parse().unwrap_or(0),
            "Encrypted" => meta.encrypted = value.starts_with("yes"),
            "PDF version" => meta.pdf_version = value.to_string(),
            _ => {}
        }
    }

    meta
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOX_OUTPUT: &str = "\
Title:          A Sample Document
Pages:          1
Page    1 size: 612 x 792 pts (letter)
Page    1 rot:  0
Page    1 MediaBox:     0.00     0.00   612.00   792.00
Page    1 CropBox:      0.00     0.00   612.00   792.00
Page    1 BleedBox:     0.00     0.00   612.00   792.00
";

    #[test]
    fn parses_us_letter_media_box() {
        assert_eq!(parse_media_box(BOX_OUTPUT), Some((612.0, 792.0)));
    }

    #[test]
    fn media_box_uses_absolute_differences() {
        // Origin-shifted and inverted coordinates still yield positive sizes.
        let out = "Page    3 MediaBox:    20.00   800.00   632.00     8.00";
        assert_eq!(parse_media_box(out), Some((612.0, 792.0)));
    }

    #[test]
    fn missing_media_box_is_none() {
        let out = "Title: x\nPages: 2\nPage    1 size: 612 x 792 pts (letter)\n";
        assert_eq!(parse_media_box(out), None);
    }

    #[test]
    fn truncated_media_box_is_none() {
        let out = "Page    1 MediaBox:     0.00     0.00   612.00";
        assert_eq!(parse_media_box(out), None);
    }

    #[test]
    fn parsing_is_idempotent() {
        assert_eq!(parse_media_box(BOX_OUTPUT), parse_media_box(BOX_OUTPUT));
    }

    #[test]
    fn parses_full_pdfinfo_output() {
        let out = "\
Title:          Attention Is All You Need
Author:         Vaswani et al.
Creator:        LaTeX with hyperref
Producer:       pdfTeX-1.40.25
Pages:          15
Encrypted:      no
Page size:      612 x 792 pts (letter)
File size:      2215244 bytes
PDF version:    1.5
";
        let meta = parse_pdfinfo(out);
        assert_eq!(meta.title.as_deref(), Some("Attention Is All You Need"));
        assert_eq!(meta.page_count, 15);
        assert_eq!(meta.pdf_version, "1.5");
        assert!(!meta.encrypted);
    }

    #[test]
    fn encrypted_yes_with_detail() {
        let out = "Pages:          4\nEncrypted:      yes (print:yes copy:no)\n";
        let meta = parse_pdfinfo(out);
        assert!(meta.encrypted);
        assert_eq!(meta.page_count, 4);
    }

    #[test]
    fn empty_output_is_default() {
        let meta = parse_pdfinfo("");
        assert_eq!(meta.page_count, 0);
        assert!(meta.title.is_none());
    }
}
