//! Exporter integration tests: full-page DocTags sequences the way a
//! vision model actually emits them, run through the same cleanup and
//! export path the conversion loop uses.

use pdf2docling::export_to_markdown;
use pdf2docling::pipeline::postprocess::clean_doctags;

/// Model output for a typical report page: heading, body text, a table
/// with a caption, and a page footer that must not survive export.
const REPORT_PAGE: &str = "<doctag>\
<page_header><loc_30><loc_10><loc_470><loc_20>ACME Quarterly</page_header>\
<title><loc_50><loc_40><loc_450><loc_60>Q3 Results</title>\
<section_header_level_1><loc_50><loc_80><loc_300><loc_95>Revenue</section_header_level_1>\
<text><loc_50><loc_100><loc_450><loc_140>Revenue grew 12% quarter over quarter, driven by the EMEA region.</text>\
<otsl><loc_50><loc_160><loc_450><loc_260>\
<ched>Region<ched>Revenue<nl>\
<fcel>EMEA<fcel>4.1M<nl>\
<fcel>APAC<fcel>2.7M<nl>\
<caption><loc_50><loc_270><loc_450><loc_280>Table 1: Revenue by region</caption>\
</otsl>\
<page_footer><loc_200><loc_490><loc_300><loc_500>Page 7 of 32</page_footer>\
</doctag>";

#[test]
fn report_page_exports_structured_markdown() {
    let md = export_to_markdown(REPORT_PAGE);

    assert!(md.starts_with("# Q3 Results"), "got:\n{md}");
    assert!(md.contains("## Revenue"));
    assert!(md.contains("Revenue grew 12% quarter over quarter"));

    // Table renders as GFM with the header row delimited.
    assert!(md.contains("| Region | Revenue |"));
    assert!(md.contains("|---|---|"));
    assert!(md.contains("| EMEA | 4.1M |"));
    assert!(md.contains("Table 1: Revenue by region"));

    // Running headers and footers are noise, not content.
    assert!(!md.contains("ACME Quarterly"));
    assert!(!md.contains("Page 7 of 32"));
    // No location tokens or raw markup leak through.
    assert!(!md.contains("<loc_"));
    assert!(!md.contains("<otsl>"));
}

#[test]
fn fenced_and_token_terminated_output_cleans_to_same_markdown() {
    // Servers differ in how they terminate: some fence the markup, some
    // append end-of-sequence tokens. Both must clean to the same document.
    let plain = "<doctag><text><loc_1><loc_2><loc_3><loc_4>hello world</text></doctag>";
    let fenced = format!("```xml\n{plain}\n```");
    let tokened = format!("{plain}<end_of_utterance>");

    let expected = export_to_markdown(&clean_doctags(plain));
    assert_eq!(export_to_markdown(&clean_doctags(&fenced)), expected);
    assert_eq!(export_to_markdown(&clean_doctags(&tokened)), expected);
    assert_eq!(expected, "hello world");
}

#[test]
fn truncated_generation_still_yields_open_elements() {
    // An output cut off mid-element at the token limit: the open text
    // element runs to the end of input rather than being dropped.
    let truncated = "<doctag>\
<section_header_level_1><loc_1><loc_2><loc_3><loc_4>Methods</section_header_level_1>\
<text><loc_1><loc_2><loc_3><loc_4>The study was conducted over";

    let md = export_to_markdown(&clean_doctags(truncated));
    assert!(md.contains("## Methods"));
    assert!(md.contains("The study was conducted over"));
}

#[test]
fn lists_code_and_formula_blocks() {
    let page = "<doctag>\
<ordered_list>\
<list_item><loc_1><loc_2><loc_3><loc_4>prepare the sample</list_item>\
<list_item><loc_1><loc_2><loc_3><loc_4>measure twice</list_item>\
</ordered_list>\
<code><loc_1><loc_2><loc_3><loc_4>fn main() { println!(\"hi\"); }</code>\
<formula><loc_1><loc_2><loc_3><loc_4>E = mc^2</formula>\
</doctag>";

    let md = export_to_markdown(page);
    assert!(md.contains("1. prepare the sample"));
    assert!(md.contains("2. measure twice"));
    assert!(md.contains("```\nfn main() { println!(\"hi\"); }\n```"));
    assert!(md.contains("$$E = mc^2$$"));
}

#[test]
fn picture_with_caption_renders_placeholder() {
    let page = "<doctag>\
<picture><loc_1><loc_2><loc_3><loc_4>\
<caption><loc_1><loc_2><loc_3><loc_4>Figure 2: System overview</caption>\
</picture>\
</doctag>";

    let md = export_to_markdown(page);
    assert!(md.contains("<!-- image -->"));
    assert!(md.contains("Figure 2: System overview"));
}

#[test]
fn empty_model_output_exports_empty_document() {
    let cleaned = clean_doctags("  \n<end_of_utterance>\n");
    assert_eq!(cleaned, "<doctag></doctag>");
    assert_eq!(export_to_markdown(&cleaned), "");
}
