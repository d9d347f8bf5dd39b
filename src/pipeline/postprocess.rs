//! Deterministic cleanup of raw model output before the DocTags export.
//!
//! Serving stacks and the models themselves leak artefacts around the
//! markup: chat end-of-turn tokens, a stray code fence, leading whitespace
//! from the generation prompt. These rules are cheap string/regex passes
//! that fix transport quirks without touching the markup content, so the
//! exporter can assume well-formed input. Each rule is a pure function and
//! independently testable.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules to raw model output.
///
/// Rules (applied in order):
/// 1. Strip an outer code fence some models wrap their answer in
/// 2. Remove chat special tokens (`<end_of_utterance>`, `<|im_end|>`, `</s>`)
/// 3. Trim surrounding whitespace
/// 4. Ensure the `<doctag>…</doctag>` wrapper is present
pub fn clean_doctags(raw: &str) -> String {
    let s = strip_outer_fence(raw);
    let s = strip_special_tokens(&s);
    let s = s.trim();
    ensure_doctag_wrapper(s)
}

static RE_OUTER_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:\w+)?\n(.*?)\n?```\s*$").unwrap());

fn strip_outer_fence(input: &str) -> String {
    match RE_OUTER_FENCE.captures(input.trim()) {
        Some(caps) => caps[1].to_string(),
        None => input.to_string(),
    }
}

static RE_SPECIAL_TOKENS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<end_of_utterance>|<\|im_end\|>|</s>").unwrap());

fn strip_special_tokens(input: &str) -> String {
    RE_SPECIAL_TOKENS.replace_all(input, "").to_string()
}

fn ensure_doctag_wrapper(input: &str) -> String {
    if input.is_empty() {
        return "<doctag></doctag>".to_string();
    }
    let mut s = String::with_capacity(input.len() + 18);
    if !input.starts_with("<doctag>") {
        s.push_str("<doctag>");
    }
    s.push_str(input);
    if !input.ends_with("</doctag>") {
        s.push_str("</doctag>");
    }
    s
}
