//! Display-time normalizer for model output.
//!
//! Strips lightweight markup (headings, emphasis, inline code, links,
//! horizontal rules) so a reply reads as plain prose in a surface that does
//! not render it, and squeezes runs of blank lines down to one.
//!
//! Every substitution removes characters and never adds any, so a pass that
//! changes the text always makes it shorter. [`normalize`] repeats the pass
//! until nothing changes; its output is therefore a fixpoint, and
//! normalizing twice is the same as normalizing once.
//!
//! Each pass runs in time linear in the input. Nested links and stacked
//! heading markers are resolved within a single pass.

use std::collections::VecDeque;

use once_cell::sync::Lazy;
use regex::Regex;

static HORIZONTAL_RULE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*[-*_]{3,}[ \t\r]*$").expect("valid rule pattern"));

static HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(?:#{1,6}[ \t]+)+").expect("valid heading pattern"));

static INLINE_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"`([^`\n]*)`").expect("valid code pattern"));

static BOLD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("valid bold pattern"));

static ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*(.*?)\*").expect("valid italic pattern"));

// `\s` is Unicode-aware, so lines holding only NBSP or ideographic spaces count as blank.
static BLANK_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n\s*\n").expect("valid blank-run pattern"));

/// Strip markup from `text` for plain-prose display.
///
/// Pure and total: it looks only at the text it is given.
pub fn normalize(text: &str) -> String {
    let mut current = single_pass(text);
    loop {
        let next = single_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn single_pass(text: &str) -> String {
    let text = HORIZONTAL_RULE.replace_all(text, "");
    let text = HEADING.replace_all(&text, "");
    let text = strip_links(&text);
    let text = INLINE_CODE.replace_all(&text, "${1}");
    let text = BOLD.replace_all(&text, "${1}");
    let text = ITALIC.replace_all(&text, "${1}");
    let text = BLANK_RUN.replace_all(&text, "\n\n");
    text.trim().to_string()
}

/// Replace every `[label](target)` with its label in one left-to-right scan.
///
/// A label is non-empty and holds no `]` or newline; a target is non-empty
/// and holds no `)` or newline. When a link closes, the oldest `[` still
/// open on the line is the one that pairs with it, so `[[x](y)](z)` becomes
/// `x` without a second scan.
fn strip_links(text: &str) -> String {
    let bytes = text.as_bytes();

    // next_stop[i]: index of the first `)` or newline at or after i
    let mut next_stop = vec![bytes.len(); bytes.len() + 1];
    for i in (0..bytes.len()).rev() {
        next_stop[i] = if matches!(bytes[i], b')' | b'\n') {
            i
        } else {
            next_stop[i + 1]
        };
    }

    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut open: VecDeque<usize> = VecDeque::new();
    let mut dropped = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'[' => open.push_back(out.len()),
            b'\n' => open.clear(),
            b']' => {
                let has_label = open.front().is_some_and(|&start| out.len() > start + 1);
                if has_label && bytes.get(i + 1) == Some(&b'(') {
                    let close = next_stop[i + 2];
                    if close > i + 2 && bytes.get(close) == Some(&b')') {
                        dropped.extend(open.pop_front());
                        i = close + 1;
                        continue;
                    }
                }
                open.clear();
            }
            _ => {}
        }
        out.push(bytes[i]);
        i += 1;
    }

    // Dropped brackets were recorded in increasing order.
    let mut result = Vec::with_capacity(out.len());
    let mut from = 0;
    for at in dropped {
        result.extend_from_slice(&out[from..at]);
        from = at + 1;
    }
    result.extend_from_slice(&out[from..]);

    // Only ASCII bytes were removed, so the result is still valid UTF-8.
    String::from_utf8_lossy(&result).into_owned()
}
