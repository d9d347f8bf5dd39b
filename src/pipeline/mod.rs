//! Pipeline stages for document-to-DocTags conversion.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. a different inference backend) without
//! touching other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ geometry ──▶ render ──▶ transcribe ──▶ postprocess
//! (path)    (pdfinfo)   (pdftoppm)  (vision model)  (cleanup)
//! ```
//!
//! 1. [`input`]      — validate the path and classify it as PDF or image
//! 2. [`exec`]       — spawn an external tool, capture output, enforce a deadline
//! 3. [`geometry`]   — per-page MediaBox dimensions and document metadata via pdfinfo
//! 4. [`render`]     — resolution-correct page rasterisation via pdftoppm
//! 5. [`transcribe`] — drive the vision-to-text model; the only stage with
//!    network I/O
//! 6. [`postprocess`] — deterministic cleanup of the raw model output before
//!    the DocTags export

pub mod exec;
pub mod geometry;
pub mod input;
pub mod postprocess;
pub mod render;
pub mod transcribe;
