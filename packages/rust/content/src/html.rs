//! Small helpers over rich text HTML fragments.

use std::sync::LazyLock;

use regex::Regex;

/// Closing paragraph tag, the paragraph boundary marker.
static PARAGRAPH_END_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</p\s*>").expect("valid regex"));

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

/// Split an HTML fragment into paragraphs, each ending at a closing `</p>`.
///
/// Text after the last `</p>` becomes a final paragraph as-is (no tag is
/// invented). Whitespace-only pieces are glued to the neighbouring paragraph,
/// so concatenating the result gives back the input, minus any whitespace in
/// a fragment that has no paragraph at all.
pub fn split_paragraphs(html: &str) -> Vec<String> {
    let mut pieces: Vec<&str> = Vec::new();
    let mut start = 0;
    for m in PARAGRAPH_END_RE.find_iter(html) {
        pieces.push(&html[start..m.end()]);
        start = m.end();
    }
    if start < html.len() {
        pieces.push(&html[start..]);
    }

    let mut paragraphs: Vec<String> = Vec::new();
    let mut leading = String::new();
    for piece in pieces {
        if piece.trim().is_empty() {
            match paragraphs.last_mut() {
                Some(last) => last.push_str(piece),
                None => leading.push_str(piece),
            }
        } else {
            let mut paragraph = std::mem::take(&mut leading);
            paragraph.push_str(piece);
            paragraphs.push(paragraph);
        }
    }
    paragraphs
}

/// Number of paragraphs [`split_paragraphs`] would produce.
pub fn paragraph_count(html: &str) -> usize {
    split_paragraphs(html).len()
}

/// Visible text of a fragment with tags removed, for previews.
pub fn strip_tags(html: &str) -> String {
    TAG_RE.replace_all(html, "").to_string()
}
