//! DocTags → Markdown export.
//!
//! DocTags is the markup dialect emitted by docling-style vision models: a
//! flat sequence of block elements, each wrapped in a tag and prefixed with
//! four `<loc_N>` location tokens giving its bounding box on the page.
//! Tables use OTSL, a token-per-cell encoding (`<fcel>` content cell,
//! `<ched>` column header, `<rhed>` row header, `<ecel>` empty,
//! `<lcel>`/`<ucel>` span continuations, `<nl>` row break).
//!
//! The export is a pure function of the markup: location tokens are
//! dropped, block tags map to their Markdown equivalents, and anything
//! unrecognised degrades to plain text rather than being lost. Truncated
//! markup (the model ran out of tokens mid-element) is handled by treating
//! an unclosed element as running to the end of input.

use once_cell::sync::Lazy;
use regex::Regex;

/// A parsed DocTags block element.
#[derive(Debug, Clone, PartialEq)]
enum Element {
    Title(String),
    SectionHeader { level: usize, text: String },
    Text(String),
    Caption(String),
    Footnote(String),
    Code(String),
    Formula(String),
    Picture { caption: Option<String> },
    List { ordered: bool, items: Vec<String> },
    Table { rows: Vec<Vec<String>>, caption: Option<String> },
}

/// Export DocTags markup to Markdown.
///
/// The result has blocks separated by blank lines and no trailing newline.
pub fn export_to_markdown(doctags: &str) -> String {
    let blocks: Vec<String> = parse_elements(doctags)
        .iter()
        .filter_map(render_element)
        .collect();
    blocks.join("\n\n")
}

static RE_LOC: Lazy<Regex> = Lazy::new(|| Regex::new(r"<loc_\d+>").unwrap());

fn strip_loc(input: &str) -> String {
    RE_LOC.replace_all(input, "").to_string()
}

// ── Parsing ──────────────────────────────────────────────────────────────

/// Elements whose content must never be emitted.
const DROPPED_TAGS: &[&str] = &["page_header", "page_footer"];

fn parse_elements(input: &str) -> Vec<Element> {
    let cleaned = strip_loc(input);
    let body = cleaned
        .trim()
        .trim_start_matches("<doctag>")
        .trim_end_matches("</doctag>");

    let mut elements = Vec::new();
    let mut cur = body;

    while let Some(open) = cur.find('<') {
        let stray = cur[..open].trim();
        if !stray.is_empty() {
            elements.push(Element::Text(stray.to_string()));
        }

        let Some(close) = cur[open..].find('>') else {
            // Dangling '<' from truncated generation.
            break;
        };
        let tag = &cur[open + 1..open + close];
        let after = &cur[open + close + 1..];

        // Stray closing tag or malformed token: skip it.
        if tag.starts_with('/') || tag.is_empty() || !is_tag_name(tag) {
            cur = after;
            continue;
        }

        // Void elements carry no content.
        if tag == "page_break" {
            cur = after;
            continue;
        }

        // Block element: consume up to the matching close tag, or to the
        // end of input when the markup was truncated.
        let end_marker = format!("</{tag}>");
        let (inner, rest) = match after.find(&end_marker) {
            Some(end) => (&after[..end], &after[end + end_marker.len()..]),
            None => (after, ""),
        };
        cur = rest;

        if DROPPED_TAGS.contains(&tag) {
            continue;
        }
        if let Some(el) = element_from(tag, inner) {
            elements.push(el);
        }
    }

    let tail = cur.trim();
    if !tail.is_empty() {
        elements.push(Element::Text(tail.to_string()));
    }

    elements
}

fn is_tag_name(s: &str) -> bool {
    s.chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

fn element_from(tag: &str, inner: &str) -> Option<Element> {
    if let Some(level) = tag.strip_prefix("section_header_level_") {
        let level: usize = level.parse().unwrap_or(1);
        return Some(Element::SectionHeader {
            level,
            text: flatten(inner),
        });
    }

    match tag {
        "title" => Some(Element::Title(flatten(inner))),
        "text" | "paragraph" | "checkbox_selected" | "checkbox_unselected" => {
            Some(Element::Text(flatten(inner)))
        }
        "caption" => Some(Element::Caption(flatten(inner))),
        "footnote" => Some(Element::Footnote(flatten(inner))),
        "code" => Some(Element::Code(inner.trim().to_string())),
        "formula" => Some(Element::Formula(inner.trim().to_string())),
        "picture" | "chart" => Some(Element::Picture {
            caption: extract_caption(inner),
        }),
        "unordered_list" => Some(Element::List {
            ordered: false,
            items: parse_list_items(inner),
        }),
        "ordered_list" => Some(Element::List {
            ordered: true,
            items: parse_list_items(inner),
        }),
        "otsl" => {
            let (rows, caption) = parse_otsl(inner);
            Some(Element::Table { rows, caption })
        }
        // Unknown tag: keep the content, drop the tag.
        _ => {
            let text = flatten(inner);
            if text.is_empty() {
                None
            } else {
                Some(Element::Text(text))
            }
        }
    }
}

/// Drop any residual inner tags and collapse whitespace.
fn flatten(inner: &str) -> String {
    let mut out = String::with_capacity(inner.len());
    let mut cur = inner;
    while let Some(open) = cur.find('<') {
        out.push_str(&cur[..open]);
        match cur[open..].find('>') {
            Some(close) => cur = &cur[open + close + 1..],
            None => {
                cur = "";
            }
        }
    }
    out.push_str(cur);
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn extract_caption(inner: &str) -> Option<String> {
    let start = inner.find("<caption>")? + "<caption>".len();
    let end = inner[start..].find("</caption>")? + start;
    let text = flatten(&inner[start..end]);
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn parse_list_items(inner: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut cur = inner;
    while let Some(start) = cur.find("<list_item>") {
        let after = &cur[start + "<list_item>".len()..];
        let (item, rest) = match after.find("</list_item>") {
            Some(end) => (&after[..end], &after[end + "</list_item>".len()..]),
            None => (after, ""),
        };
        let text = flatten(item);
        if !text.is_empty() {
            items.push(text);
        }
        cur = rest;
    }
    items
}

/// Parse OTSL cell tokens into rows, extracting an optional caption.
fn parse_otsl(inner: &str) -> (Vec<Vec<String>>, Option<String>) {
    let caption = extract_caption(inner);
    // Remove the caption element so its text is not read as cell content.
    let body = match (inner.find("<caption>"), inner.find("</caption>")) {
        (Some(s), Some(e)) if e > s => {
            format!("{}{}", &inner[..s], &inner[e + "</caption>".len()..])
        }
        _ => inner.to_string(),
    };

    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut cur = body.as_str();

    while let Some(open) = cur.find('<') {
        let Some(close) = cur[open..].find('>') else {
            break;
        };
        let tag = &cur[open + 1..open + close];
        let after = &cur[open + close + 1..];
        let content_end = after.find('<').unwrap_or(after.len());
        let content = after[..content_end].trim();

        match tag {
            "fcel" | "ched" | "rhed" | "srow" => row.push(content.to_string()),
            // Empty cells and span continuations render as blank cells.
            "ecel" | "lcel" | "ucel" | "xcel" => row.push(String::new()),
            "nl" => rows.push(std::mem::take(&mut row)),
            _ => {}
        }
        cur = &after[content_end..];
    }
    if !row.is_empty() {
        rows.push(row);
    }

    (rows, caption)
}

// ── Rendering ────────────────────────────────────────────────────────────

fn render_element(el: &Element) -> Option<String> {
    match el {
        Element::Title(text) => {
            if text.is_empty() {
                None
            } else {
                Some(format!("# {text}"))
            }
        }
        Element::SectionHeader { level, text } => {
            if text.is_empty() {
                return None;
            }
            // DocTags levels start at 1 below the document title.
            let hashes = "#".repeat((level + 1).min(6));
            Some(format!("{hashes} {text}"))
        }
        Element::Text(text) | Element::Caption(text) | Element::Footnote(text) => {
            non_empty(text.clone())
        }
        Element::Code(code) => {
            if code.is_empty() {
                None
            } else {
                Some(format!("```\n{code}\n```"))
            }
        }
        Element::Formula(src) => {
            if src.is_empty() {
                None
            } else {
                Some(format!("$${src}$$"))
            }
        }
        Element::Picture { caption } => Some(match caption {
            Some(c) => format!("<!-- image -->\n\n{c}"),
            None => "<!-- image -->".to_string(),
        }),
        Element::List { ordered, items } => {
            if items.is_empty() {
                return None;
            }
            let lines: Vec<String> = items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    if *ordered {
                        format!("{}. {item}", i + 1)
                    } else {
                        format!("- {item}")
                    }
                })
                .collect();
            Some(lines.join("\n"))
        }
        Element::Table { rows, caption } => render_table(rows, caption.as_deref()),
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

fn render_table(rows: &[Vec<String>], caption: Option<&str>) -> Option<String> {
    if rows.is_empty() {
        return caption.map(str::to_string);
    }
    let cols = rows.iter().map(Vec::len).max().unwrap_or(0);
    if cols == 0 {
        return caption.map(str::to_string);
    }

    let render_row = |row: &[String]| -> String {
        let mut cells: Vec<String> = row.iter().map(|c| c.replace('|', "\\|")).collect();
        cells.resize(cols, String::new());
        format!("| {} |", cells.join(" | "))
    };

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(render_row(&rows[0]));
    lines.push(format!("|{}", "---|".repeat(cols)));
    for row in &rows[1..] {
        lines.push(render_row(row));
    }

    let table = lines.join("\n");
    match caption {
        Some(c) => Some(format!("{c}\n\n{table}")),
        None => Some(table),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_location_tokens() {
        let md = export_to_markdown(
            "<doctag><text><loc_43><loc_36><loc_242><loc_46>Hello world</text></doctag>",
        );
        assert_eq!(md, "Hello world");
    }

    #[test]
    fn title_and_section_headers() {
        let md = export_to_markdown(
            "<doctag>\
             <title><loc_1><loc_1><loc_2><loc_2>Report</title>\
             <section_header_level_1><loc_1><loc_1><loc_2><loc_2>Intro</section_header_level_1>\
             <section_header_level_2><loc_1><loc_1><loc_2><loc_2>Scope</section_header_level_2>\
             </doctag>",
        );
        assert_eq!(md, "# Report\n\n## Intro\n\n### Scope");
    }

    #[test]
    fn header_level_is_capped_at_six() {
        let md = export_to_markdown(
            "<doctag><section_header_level_9>Deep</section_header_level_9></doctag>",
        );
        assert_eq!(md, "###### Deep");
    }

    #[test]
    fn unordered_and_ordered_lists() {
        let md = export_to_markdown(
            "<doctag><unordered_list>\
             <list_item><loc_1><loc_2><loc_3><loc_4>alpha</list_item>\
             <list_item>beta</list_item>\
             </unordered_list>\
             <ordered_list><list_item>one</list_item><list_item>two</list_item></ordered_list>\
             </doctag>",
        );
        assert_eq!(md, "- alpha\n- beta\n\n1. one\n2. two");
    }

    #[test]
    fn code_and_formula() {
        let md = export_to_markdown(
            "<doctag><code><loc_1><loc_2><loc_3><loc_4>fn main() {}</code>\
             <formula>E = mc^2</formula></doctag>",
        );
        assert_eq!(md, "```\nfn main() {}\n```\n\n$$E = mc^2$$");
    }

    #[test]
    fn picture_renders_placeholder_with_caption() {
        let md = export_to_markdown(
            "<doctag><picture><loc_1><loc_2><loc_3><loc_4>\
             <caption>Figure 1: Results</caption></picture></doctag>",
        );
        assert_eq!(md, "<!-- image -->\n\nFigure 1: Results");
        let md = export_to_markdown("<doctag><picture><loc_1><loc_2><loc_3><loc_4></picture></doctag>");
        assert_eq!(md, "<!-- image -->");
    }

    #[test]
    fn otsl_table_to_gfm() {
        let md = export_to_markdown(
            "<doctag><otsl><loc_1><loc_2><loc_3><loc_4>\
             <ched>Name<ched>Score<nl>\
             <fcel>ada<fcel>9<nl>\
             <fcel>grace<ecel><nl>\
             </otsl></doctag>",
        );
        assert_eq!(
            md,
            "| Name | Score |\n|---|---|\n| ada | 9 |\n| grace |  |"
        );
    }

    #[test]
    fn otsl_caption_and_pipe_escaping() {
        let md = export_to_markdown(
            "<doctag><otsl><caption>Table 2</caption>\
             <fcel>a|b<fcel>c<nl></otsl></doctag>",
        );
        assert!(md.starts_with("Table 2\n\n"));
        assert!(md.contains("a\\|b"));
    }

    #[test]
    fn page_header_and_footer_are_dropped() {
        let md = export_to_markdown(
            "<doctag><page_header><loc_1><loc_2><loc_3><loc_4>Running head</page_header>\
             <text>Body</text>\
             <page_footer>3</page_footer></doctag>",
        );
        assert_eq!(md, "Body");
    }

    #[test]
    fn unknown_tag_keeps_content() {
        let md = export_to_markdown("<doctag><mystery_block>kept text</mystery_block></doctag>");
        assert_eq!(md, "kept text");
    }

    #[test]
    fn truncated_markup_still_exports() {
        // Generation cut off mid-element: no closing tags at all.
        let md = export_to_markdown("<doctag><text><loc_1><loc_2><loc_3><loc_4>unfinished para");
        assert_eq!(md, "unfinished para");
    }

    #[test]
    fn empty_document() {
        assert_eq!(export_to_markdown("<doctag></doctag>"), "");
    }
}
