//! Configuration types for document-to-DocTags conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Every knob lives in one explicit
//! struct so a configuration can be shared across calls, logged, and diffed
//! between two runs to understand why their outputs differ.

use crate::error::Pdf2DoclingError;
use crate::pipeline::transcribe::PageTranscriber;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Target longest-side dimension used by the standalone
/// [`render_page`](crate::pipeline::render::render_page) API.
///
/// The document-processing loop uses the smaller
/// [`ConversionConfig::target_longest_dim`] (default 1024) instead: inside a
/// multi-page conversion the model sees every page anyway, so the extra
/// pixels only cost render time and upload size.
pub const DEFAULT_TARGET_DIM: u32 = 2048;

/// Configuration for a document-to-DocTags conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2docling::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .target_longest_dim(1024)
///     .endpoint("http://localhost:8000/v1")
///     .model("ds4sd/SmolDocling-256M-preview")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Longest-side pixel target for rendered pages in the document loop. Default: 1024.
    ///
    /// The rendering DPI is derived per page as `target * 72 / longest_pt`,
    /// so portrait and landscape pages of any physical size all come out
    /// with the same longest side. 1024 px is enough for the model to read
    /// body text; raise it for small-font documents.
    pub target_longest_dim: u32,

    /// Deadline for one external rasterisation process, in seconds. Default: 120.
    ///
    /// pdftoppm on a pathological page (huge embedded images, broken
    /// streams) can hang for minutes. The deadline fails the conversion with
    /// [`Pdf2DoclingError::RenderTimeout`] rather than blocking forever.
    pub render_timeout_secs: u64,

    /// Compute device requested for inference. Default: [`Device::Cpu`].
    ///
    /// Forwarded to the transcriber backend. The bundled HTTP backend runs
    /// against a server that chose its own hardware, so it only records the
    /// value; custom in-process backends can honour it directly.
    pub device: Device,

    /// Base URL of an OpenAI-compatible chat-completions endpoint.
    /// Default: `http://localhost:8000/v1`.
    pub endpoint: String,

    /// Model identifier sent to the endpoint. Default: `ds4sd/SmolDocling-256M-preview`.
    pub model: String,

    /// Bearer token for the endpoint, if it requires one.
    pub api_key: Option<String>,

    /// Maximum tokens the model may generate per page. Default: 8192.
    ///
    /// DocTags markup is verbose (every element carries four location
    /// tokens); dense pages routinely exceed 4k output tokens. Setting this
    /// too low truncates the markup mid-element and breaks the export.
    pub max_tokens: usize,

    /// Sampling temperature. Default: 0.0.
    ///
    /// Transcription wants the model deterministic and faithful to the page;
    /// any creativity only corrupts it.
    pub temperature: f32,

    /// Per-page inference timeout in seconds. Default: 300.
    pub api_timeout_secs: u64,

    /// Custom instruction sent with each page image. If None, uses the
    /// built-in [`crate::prompts::DOCLING_INSTRUCTION`].
    pub prompt: Option<String>,

    /// Pre-constructed transcriber. Takes precedence over `endpoint`/`model`.
    pub transcriber: Option<Arc<dyn PageTranscriber>>,

    /// Page selection. Default: all pages.
    pub pages: PageSelection,

    /// Page separator in assembled Markdown output. Default: None.
    pub page_separator: PageSeparator,

    /// Per-page progress events. Default: none.
    pub progress_callback: Option<ProgressCallback>,

    /// Name or path of the page-info utility. Default: `pdfinfo`.
    pub pdfinfo_bin: String,

    /// Name or path of the rasterisation utility. Default: `pdftoppm`.
    pub pdftoppm_bin: String,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            target_longest_dim: 1024,
            render_timeout_secs: 120,
            device: Device::Cpu,
            endpoint: "http://localhost:8000/v1".to_string(),
            model: "ds4sd/SmolDocling-256M-preview".to_string(),
            api_key: None,
            max_tokens: 8192,
            temperature: 0.0,
            api_timeout_secs: 300,
            prompt: None,
            transcriber: None,
            pages: PageSelection::default(),
            page_separator: PageSeparator::default(),
            progress_callback: None,
            pdfinfo_bin: "pdfinfo".to_string(),
            pdftoppm_bin: "pdftoppm".to_string(),
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("target_longest_dim", &self.target_longest_dim)
            .field("render_timeout_secs", &self.render_timeout_secs)
            .field("device", &self.device)
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field(
                "transcriber",
                &self.transcriber.as_ref().map(|_| "<dyn PageTranscriber>"),
            )
            .field("pages", &self.pages)
            .field("page_separator", &self.page_separator)
            .field("pdfinfo_bin", &self.pdfinfo_bin)
            .field("pdftoppm_bin", &self.pdftoppm_bin)
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn target_longest_dim(mut self, px: u32) -> Self {
        self.config.target_longest_dim = px.max(32);
        self
    }

    pub fn render_timeout_secs(mut self, secs: u64) -> Self {
        self.config.render_timeout_secs = secs.max(1);
        self
    }

    pub fn device(mut self, device: Device) -> Self {
        self.config.device = device;
        self
    }

    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs.max(1);
        self
    }

    pub fn prompt(mut self, instruction: impl Into<String>) -> Self {
        self.config.prompt = Some(instruction.into());
        self
    }

    pub fn transcriber(mut self, t: Arc<dyn PageTranscriber>) -> Self {
        self.config.transcriber = Some(t);
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn page_separator(mut self, sep: PageSeparator) -> Self {
        self.config.page_separator = sep;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    pub fn pdfinfo_bin(mut self, bin: impl Into<String>) -> Self {
        self.config.pdfinfo_bin = bin.into();
        self
    }

    pub fn pdftoppm_bin(mut self, bin: impl Into<String>) -> Self {
        self.config.pdftoppm_bin = bin.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Pdf2DoclingError> {
        let c = &self.config;
        if c.target_longest_dim == 0 {
            return Err(Pdf2DoclingError::InvalidConfig(
                "target_longest_dim must be ≥ 1".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(Pdf2DoclingError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.pdfinfo_bin.is_empty() || c.pdftoppm_bin.is_empty() {
            return Err(Pdf2DoclingError::InvalidConfig(
                "external tool names must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Compute device requested for inference.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Device {
    /// Plain CPU inference (default).
    #[default]
    Cpu,
    /// An accelerator identifier as understood by the backend,
    /// e.g. `cuda`, `cuda:1`, `mps`.
    Accelerator(String),
}

impl Device {
    /// Parse a user-supplied device string.
    pub fn parse(s: &str) -> Device {
        match s.trim().to_lowercase().as_str() {
            "" | "cpu" => Device::Cpu,
            other => Device::Accelerator(other.to_string()),
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Accelerator(id) => write!(f, "{id}"),
        }
    }
}

/// Specifies which pages of the PDF to convert.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum PageSelection {
    /// Convert all pages (default).
    #[default]
    All,
    /// Convert a single page (1-indexed).
    Single(usize),
    /// Convert a contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Convert specific pages (1-indexed, deduplicated).
    Set(Vec<usize>),
}

impl PageSelection {
    /// Expand the selection into a sorted, deduplicated list of 1-indexed
    /// page numbers within `[1, total_pages]`.
    pub fn to_page_numbers(&self, total_pages: usize) -> Vec<usize> {
        let mut pages: Vec<usize> = match self {
            PageSelection::All => (1..=total_pages).collect(),
            PageSelection::Single(p) => {
                if *p >= 1 && *p <= total_pages {
                    vec![*p]
                } else {
                    vec![]
                }
            }
            PageSelection::Range(start, end) => {
                let s = (*start).max(1);
                let e = (*end).min(total_pages);
                (s..=e).collect()
            }
            PageSelection::Set(set) => set
                .iter()
                .copied()
                .filter(|&p| p >= 1 && p <= total_pages)
                .collect(),
        };
        pages.sort_unstable();
        pages.dedup();
        pages
    }
}

/// How to separate pages in the assembled Markdown output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum PageSeparator {
    /// No separator; pages joined with "\n\n". (default)
    #[default]
    None,
    /// Horizontal rule: "\n\n---\n\n"
    HorizontalRule,
    /// HTML comment with page number: "<!-- page N -->"
    Comment,
    /// Custom string inserted between pages.
    Custom(String),
}

impl PageSeparator {
    /// Render the separator string for the given page number (1-indexed).
    pub fn render(&self, page_num: usize) -> String {
        match self {
            PageSeparator::None => "\n\n".to_string(),
            PageSeparator::HorizontalRule => "\n\n---\n\n".to_string(),
            PageSeparator::Comment => format!("\n\n<!-- page {} -->\n\n", page_num),
            PageSeparator::Custom(s) => format!("\n\n{}\n\n", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let c = ConversionConfig::builder().build().unwrap();
        assert_eq!(c.target_longest_dim, 1024);
        assert_eq!(c.render_timeout_secs, 120);
        assert_eq!(c.max_tokens, 8192);
        assert_eq!(c.device, Device::Cpu);
        assert_eq!(c.pdfinfo_bin, "pdfinfo");
        assert_eq!(c.pdftoppm_bin, "pdftoppm");
    }

    #[test]
    fn builder_clamps_small_target() {
        let c = ConversionConfig::builder()
            .target_longest_dim(1)
            .build()
            .unwrap();
        assert_eq!(c.target_longest_dim, 32);
    }

    #[test]
    fn builder_rejects_empty_tool_name() {
        let mut c = ConversionConfig::default();
        c.pdftoppm_bin = String::new();
        let err = ConversionConfigBuilder { config: c }.build().unwrap_err();
        assert!(matches!(err, Pdf2DoclingError::InvalidConfig(_)));
    }

    #[test]
    fn device_parse() {
        assert_eq!(Device::parse("cpu"), Device::Cpu);
        assert_eq!(Device::parse(""), Device::Cpu);
        assert_eq!(
            Device::parse("cuda:1"),
            Device::Accelerator("cuda:1".into())
        );
        assert_eq!(Device::parse("CUDA").to_string(), "cuda");
    }

    #[test]
    fn page_selection_to_page_numbers() {
        assert_eq!(PageSelection::All.to_page_numbers(3), vec![1, 2, 3]);
        assert_eq!(PageSelection::Single(2).to_page_numbers(3), vec![2]);
        assert_eq!(
            PageSelection::Single(4).to_page_numbers(3),
            Vec::<usize>::new()
        );
        assert_eq!(PageSelection::Range(2, 9).to_page_numbers(4), vec![2, 3, 4]);
        assert_eq!(
            PageSelection::Set(vec![3, 1, 3]).to_page_numbers(5),
            vec![1, 3]
        );
    }

    #[test]
    fn page_separator_render() {
        assert_eq!(PageSeparator::None.render(2), "\n\n");
        assert!(PageSeparator::Comment.render(2).contains("page 2"));
        assert_eq!(
            PageSeparator::Custom("* * *".into()).render(1),
            "\n\n* * *\n\n"
        );
    }
}
