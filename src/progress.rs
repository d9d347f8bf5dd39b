//! Progress-callback trait for per-page conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the pipeline works through the document. Pages are processed
//! strictly sequentially in ascending order, so events arrive in order and
//! implementations need no synchronisation beyond `Send + Sync`.

use std::sync::Arc;

/// Convenience alias for the callback handle stored in the config.
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

/// Called by the conversion pipeline as it processes each page.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. There is no error event: the pipeline is fail-fast
/// and the first page error aborts the conversion through the normal
/// `Result` path.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once, after the document has been opened and the page
    /// selection expanded, with the number of pages that will be processed.
    fn on_conversion_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called just before a page is rendered.
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called after a page has been rendered, transcribed, and exported.
    fn on_page_complete(&self, page_num: usize, total_pages: usize, markdown_len: usize) {
        let _ = (page_num, total_pages, markdown_len);
    }

    /// Called once after the last page, with the number of pages converted.
    fn on_conversion_complete(&self, processed_pages: usize) {
        let _ = processed_pages;
    }
}
