//! CLI binary for pdf2docling.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2docling::{
    convert, convert_to_file, inspect, ConversionConfig, ConversionProgressCallback, Device,
    PageSelection, PageSeparator, ProgressCallback,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar advanced page by page. Pages are
/// processed sequentially, so events always arrive in order.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    /// Create a callback whose bar length is set by `on_conversion_start`
    /// once the page count is known.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_prefix("Preparing");
        bar.set_message("Opening document…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_pages: usize) {
        self.bar.set_length(total_pages as u64);
        self.bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {pos:>3}/{len} pages  ⏱ {elapsed_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        self.bar.set_prefix("Converting");
    }

    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        self.bar
            .set_message(format!("page {page_num}/{total_pages}"));
    }

    fn on_page_complete(&self, page_num: usize, total_pages: usize, markdown_len: usize) {
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            green("✓"),
            page_num,
            total_pages,
            dim(&format!("{markdown_len:>5} chars")),
        ));
        self.bar.inc(1);
    }

    fn on_conversion_complete(&self, processed_pages: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} pages converted",
            green("✔"),
            bold(&processed_pages.to_string())
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Basic conversion (Markdown to stdout)
  pdf2docling document.pdf

  # Convert to file
  pdf2docling document.pdf -o output.md

  # Specific pages against a local llama.cpp / vLLM server
  pdf2docling --pages 1-5 --endpoint http://localhost:8000/v1 paper.pdf

  # Raw DocTags markup instead of Markdown
  pdf2docling --doctags scan.png

  # Inspect metadata (no model needed)
  pdf2docling --inspect-only document.pdf

  # Request accelerator inference from a backend that supports it
  pdf2docling --device cuda document.pdf

REQUIREMENTS:
  PDF inputs need the poppler utilities on PATH:
    apt install poppler-utils     (Debian/Ubuntu)
    brew install poppler          (macOS)
  JPG/PNG inputs are decoded in-process and need no external tools.

ENVIRONMENT VARIABLES:
  PDF2DOCLING_ENDPOINT   OpenAI-compatible chat-completions base URL
  PDF2DOCLING_MODEL      Model identifier sent to the endpoint
  PDF2DOCLING_API_KEY    Bearer token for the endpoint, if required
"#;

/// Convert PDF and image files to DocTags and Markdown using a vision model.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2docling",
    version,
    about = "Convert PDF and image files to DocTags and Markdown using a vision model",
    arg_required_else_help = true,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Path to the file to process (PDF, JPG, or PNG).
    input: String,

    /// Compute device: cpu or an accelerator identifier (e.g. cuda, cuda:1).
    #[arg(long, default_value = "cpu")]
    device: String,

    /// Write Markdown to this file instead of stdout.
    #[arg(short, long, env = "PDF2DOCLING_OUTPUT")]
    output: Option<PathBuf>,

    /// OpenAI-compatible chat-completions base URL.
    #[arg(long, env = "PDF2DOCLING_ENDPOINT", default_value = "http://localhost:8000/v1")]
    endpoint: String,

    /// Model identifier sent to the endpoint.
    #[arg(long, env = "PDF2DOCLING_MODEL", default_value = "ds4sd/SmolDocling-256M-preview")]
    model: String,

    /// Bearer token for the endpoint, if required.
    #[arg(long, env = "PDF2DOCLING_API_KEY")]
    api_key: Option<String>,

    /// Longest-side pixel target for rendered pages.
    #[arg(long, env = "PDF2DOCLING_TARGET_DIM", default_value_t = 1024,
          value_parser = clap::value_parser!(u32).range(32..=8192))]
    target_dim: u32,

    /// Page selection: all, 5, 3-15, or 1,3,5,7.
    #[arg(long, env = "PDF2DOCLING_PAGES", default_value = "all")]
    pages: String,

    /// Page separator: none, hr, comment, or a custom string.
    #[arg(long, env = "PDF2DOCLING_SEPARATOR", default_value = "none")]
    separator: String,

    /// Custom per-page instruction replacing the built-in one.
    #[arg(long, env = "PDF2DOCLING_PROMPT")]
    prompt: Option<String>,

    /// Max model output tokens per page.
    #[arg(long, env = "PDF2DOCLING_MAX_TOKENS", default_value_t = 8192)]
    max_tokens: usize,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, env = "PDF2DOCLING_TEMPERATURE", default_value_t = 0.0)]
    temperature: f32,

    /// Per-page rasterisation timeout in seconds.
    #[arg(long, env = "PDF2DOCLING_RENDER_TIMEOUT", default_value_t = 120)]
    render_timeout: u64,

    /// Per-page inference timeout in seconds.
    #[arg(long, env = "PDF2DOCLING_API_TIMEOUT", default_value_t = 300)]
    api_timeout: u64,

    /// Emit raw DocTags markup instead of Markdown.
    #[arg(long)]
    doctags: bool,

    /// Output structured JSON (ConversionOutput) instead of Markdown.
    #[arg(long, env = "PDF2DOCLING_JSON")]
    json: bool,

    /// Print document metadata only, no conversion.
    #[arg(long)]
    inspect_only: bool,

    /// Disable the progress bar.
    #[arg(long, env = "PDF2DOCLING_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2DOCLING_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2DOCLING_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.doctags;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let config = build_config(&cli, None)?;
        let meta = inspect(&cli.input, &config)
            .await
            .context("Failed to inspect document")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialise metadata")?
            );
        } else {
            println!("File:         {}", cli.input);
            if let Some(ref t) = meta.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:       {}", a);
            }
            println!("Pages:        {}", meta.page_count);
            if !meta.pdf_version.is_empty() {
                println!("PDF Version:  {}", meta.pdf_version);
            }
            println!("Encrypted:    {}", meta.encrypted);
            if let Some(ref p) = meta.producer {
                println!("Producer:     {}", p);
            }
        }
        return Ok(());
    }

    // ── Build config and run ─────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new_dynamic() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    if let Some(ref output_path) = cli.output {
        let stats = convert_to_file(&cli.input, output_path, &config)
            .await
            .context("Conversion failed")?;

        if !cli.quiet {
            eprintln!(
                "{}  {}/{} pages  {}ms  →  {}",
                green("✔"),
                stats.processed_pages,
                stats.total_pages,
                stats.total_duration_ms,
                bold(&output_path.display().to_string()),
            );
        }
    } else {
        let output = convert(&cli.input, &config)
            .await
            .context("Conversion failed")?;

        if cli.json {
            let json =
                serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
            println!("{json}");
        } else {
            let text = if cli.doctags {
                let mut tags = output
                    .pages
                    .iter()
                    .map(|p| p.doctags.clone())
                    .collect::<Vec<_>>()
                    .join("\n\n");
                tags.push('\n');
                tags
            } else {
                output.markdown.clone()
            };
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(text.as_bytes())
                .context("Failed to write to stdout")?;
        }

        if !cli.quiet && !show_progress && !cli.json {
            eprintln!(
                "Converted {}/{} pages in {}ms  {}",
                output.stats.processed_pages,
                output.stats.total_pages,
                output.stats.total_duration_ms,
                dim(&format!(
                    "(render {}ms, inference {}ms)",
                    output.stats.render_duration_ms, output.stats.inference_duration_ms
                )),
            );
        }
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let pages = parse_pages(&cli.pages)?;
    let separator = parse_separator(&cli.separator);

    let mut builder = ConversionConfig::builder()
        .device(Device::parse(&cli.device))
        .endpoint(&cli.endpoint)
        .model(&cli.model)
        .target_longest_dim(cli.target_dim)
        .pages(pages)
        .page_separator(separator)
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .render_timeout_secs(cli.render_timeout)
        .api_timeout_secs(cli.api_timeout);

    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key);
    }
    if let Some(ref prompt) = cli.prompt {
        builder = builder.prompt(prompt);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Parse `--pages` string into `PageSelection`.
fn parse_pages(s: &str) -> Result<PageSelection> {
    let s = s.trim().to_lowercase();

    if s == "all" {
        return Ok(PageSelection::All);
    }

    // Range: "3-15"
    if let Some((start, end)) = s.split_once('-') {
        let start: usize = start.trim().parse().context("Invalid start page in range")?;
        let end: usize = end.trim().parse().context("Invalid end page in range")?;

        if start < 1 {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", start);
        }
        if start > end {
            anyhow::bail!("Invalid page range '{}-{}': start must be <= end", start, end);
        }

        return Ok(PageSelection::Range(start, end));
    }

    // Set: "1,3,5,7"
    if s.contains(',') {
        let pages: Vec<usize> = s
            .split(',')
            .map(|p| {
                p.trim()
                    .parse::<usize>()
                    .context(format!("Invalid page number: '{}'", p.trim()))
            })
            .collect::<Result<Vec<_>>>()?;

        for &p in &pages {
            if p < 1 {
                anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", p);
            }
        }

        return Ok(PageSelection::Set(pages));
    }

    // Single page: "5"
    let page: usize = s.parse().context("Invalid page number")?;
    if page < 1 {
        anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", page);
    }

    Ok(PageSelection::Single(page))
}

/// Parse `--separator` string into `PageSeparator`.
fn parse_separator(s: &str) -> PageSeparator {
    match s.to_lowercase().as_str() {
        "none" => PageSeparator::None,
        "hr" | "---" => PageSeparator::HorizontalRule,
        "comment" => PageSeparator::Comment,
        custom => PageSeparator::Custom(custom.to_string()),
    }
}
