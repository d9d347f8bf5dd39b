//! The instruction sent to the vision model with each page image.
//!
//! Kept in one place so changing the wording never touches transport or
//! pipeline code, and so tests can assert against it directly.

/// Default per-page instruction.
///
/// DocTags-tuned models (SmolDocling and friends) are trained on exactly
/// this phrasing; rewording it measurably degrades the markup they emit.
/// Callers can override it via [`crate::config::ConversionConfig::prompt`].
pub const DOCLING_INSTRUCTION: &str = "Convert this page to docling.";
