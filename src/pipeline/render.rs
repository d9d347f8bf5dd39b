//! Resolution-correct page rasterisation via `pdftoppm`.
//!
//! ## Why derive DPI from the MediaBox?
//!
//! `pdftoppm` takes a resolution, not an output size. Page sizes vary:
//! rendering an A0 poster and a till receipt at the same DPI produces wildly
//! different pixel counts. Deriving the DPI per page as
//! `target_px * 72 / longest_pt` (72 points per inch) makes every page come
//! out with the same longest side — the size the vision model was tuned for —
//! regardless of its physical dimensions or orientation.

use crate::config::ConversionConfig;
use crate::error::Pdf2DoclingError;
use crate::pipeline::exec::{self, ExecError};
use crate::pipeline::geometry::{self, PageGeometry};
use image::DynamicImage;
use std::path::Path;
use tracing::debug;

/// Compute the rendering resolution so that the page's longest physical
/// dimension maps to `target_px` pixels.
///
/// Returns an error if the result is not positive and finite, which can
/// only happen with degenerate geometry.
pub fn target_dpi(geometry: &PageGeometry, target_px: u32) -> Result<f64, Pdf2DoclingError> {
    let dpi = f64::from(target_px) * 72.0 / geometry.longest();
    if !dpi.is_finite() || dpi <= 0.0 {
        return Err(Pdf2DoclingError::Internal(format!(
            "computed non-finite resolution {dpi} for geometry {geometry:?}"
        )));
    }
    Ok(dpi)
}

/// Render one page of a PDF to an in-memory bitmap.
///
/// `page` is 1-indexed. The page's longest side comes out as `target_px`
/// pixels (within rounding). Invokes `pdftoppm -png -f N -l N -r <dpi>`
/// scoped to exactly the requested page and decodes its stdout.
///
/// # Errors
/// * [`Pdf2DoclingError::ExternalTool`] — pdftoppm exited non-zero
/// * [`Pdf2DoclingError::RenderTimeout`] — pdftoppm exceeded
///   `config.render_timeout_secs`; no partial image is returned
/// * [`Pdf2DoclingError::Decode`] — stdout was not a valid PNG
/// * plus any geometry error from [`geometry::get_page_dimensions`]
pub async fn render_page(
    config: &ConversionConfig,
    pdf_path: &Path,
    page: usize,
    target_px: u32,
) -> Result<DynamicImage, Pdf2DoclingError> {
    let geom = geometry::get_page_dimensions(config, pdf_path, page).await?;
    let dpi = target_dpi(&geom, target_px)?;
    debug!(page, dpi, target_px, "rendering page");

    let page_arg = page.to_string();
    let args = [
        "-png".to_string(),
        "-f".to_string(),
        page_arg.clone(),
        "-l".to_string(),
        page_arg,
        "-r".to_string(),
        dpi.to_string(),
        pdf_path.display().to_string(),
    ];

    let output = exec::run_tool(&config.pdftoppm_bin, args, config.render_timeout_secs)
        .await
        .map_err(|e| match e {
            ExecError::TimedOut { secs, .. } => Pdf2DoclingError::RenderTimeout { page, secs },
            ExecError::Spawn { source, .. } => Pdf2DoclingError::ExternalTool {
                tool: config.pdftoppm_bin.clone(),
                status: None,
                stderr: format!("could not be started: {source}"),
            },
            ExecError::NonZero { status, stderr, .. } => Pdf2DoclingError::ExternalTool {
                tool: config.pdftoppm_bin.clone(),
                status,
                stderr,
            },
        })?;

    let img = image::load_from_memory(&output.stdout).map_err(|e| Pdf2DoclingError::Decode {
        page,
        detail: e.to_string(),
    })?;

    debug!(
        page,
        width = img.width(),
        height = img.height(),
        "decoded rendered page"
    );
    Ok(img)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn us_letter_at_1024() {
        // 612 x 792 pt page, longest side 792 pt:
        // 1024 * 72 / 792 ≈ 93.09 DPI.
        let geom = PageGeometry {
            width: 612.0,
            height: 792.0,
        };
        let dpi = target_dpi(&geom, 1024).unwrap();
        assert!((dpi - 93.0909).abs() < 0.001, "got {dpi}");

        // Rendering at that DPI maps the longest side to the target
        // within a pixel.
        let longest_px = (geom.longest() * dpi / 72.0).round() as u32;
        assert!((1023..=1025).contains(&longest_px));
        let shortest_px = (geom.width * dpi / 72.0).round() as u32;
        assert!((790..=792).contains(&shortest_px), "got {shortest_px}");
    }

    #[test]
    fn landscape_uses_width_as_longest() {
        let geom = PageGeometry {
            width: 792.0,
            height: 612.0,
        };
        let dpi = target_dpi(&geom, 2048).unwrap();
        let longest_px = (geom.longest() * dpi / 72.0).round() as u32;
        assert!((2047..=2049).contains(&longest_px));
    }

    #[test]
    fn dpi_is_positive_and_finite_over_plausible_sizes() {
        // Business card through A0 poster, both orientations.
        for &(w, h) in &[
            (144.0, 252.0),
            (612.0, 792.0),
            (595.0, 842.0),
            (842.0, 595.0),
            (2384.0, 3370.0),
        ] {
            for &target in &[32u32, 1024, 2048, 4096] {
                let dpi = target_dpi(&PageGeometry { width: w, height: h }, target).unwrap();
                assert!(dpi.is_finite() && dpi > 0.0, "{w}x{h} @ {target} → {dpi}");
            }
        }
    }

    #[test]
    fn degenerate_geometry_is_rejected() {
        let geom = PageGeometry {
            width: 0.0,
            height: 0.0,
        };
        assert!(target_dpi(&geom, 1024).is_err());
    }
}
