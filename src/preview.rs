//! Terminal rendition of a generated page for the Preview tab
//!
//! A terminal cannot lay out HTML, so the preview shows the page's readable
//! text in document order: headings, paragraphs and list items on their
//! own lines, with markup and non-visible elements removed.

use std::sync::LazyLock;

use regex::Regex;

const SVG_PLACEHOLDER: &str = "[svg]";

struct Patterns {
    hidden: Regex,
    svg: Regex,
    line_break: Regex,
    list_item: Regex,
    block_end: Regex,
    tag: Regex,
    repeated_newlines: Regex,
}

static PATTERNS: LazyLock<Patterns> = LazyLock::new(|| Patterns {
    hidden: Regex::new(r"(?is)<!--.*?-->|<(head|script|style|noscript|template)\b[^>]*>.*?</\s*(head|script|style|noscript|template)\s*>")
        .expect("valid hidden-element pattern"),
    svg: Regex::new(r"(?is)<svg\b[^>]*>.*?</\s*svg\s*>").expect("valid svg pattern"),
    line_break: Regex::new(r"(?i)<br\s*/?>").expect("valid br pattern"),
    list_item: Regex::new(r"(?i)<li\b[^>]*>").expect("valid li pattern"),
    block_end: Regex::new(
        r"(?i)</\s*(p|div|section|article|header|footer|main|nav|aside|h[1-6]|li|ul|ol|tr|table|blockquote|pre|form|figure|button)\s*>|<(hr|h[1-6]|p|section|header|footer|main|nav)\b[^>]*>",
    )
    .expect("valid block pattern"),
    tag: Regex::new(r"(?s)<[^>]*>").expect("valid tag pattern"),
    repeated_newlines: Regex::new(r"\n{2,}").expect("valid newline pattern"),
});

/// Render an HTML document as plain readable text.
pub fn html_to_text(html: &str) -> String {
    let p = &*PATTERNS;

    let text = p.hidden.replace_all(html, "");
    let text = p.svg.replace_all(&text, SVG_PLACEHOLDER);
    let text = p.line_break.replace_all(&text, "\n");
    let text = p.list_item.replace_all(&text, "\n• ");
    let text = p.block_end.replace_all(&text, "\n");
    let text = p.tag.replace_all(&text, "");
    let text = decode_entities(&text);

    let joined = collapse_whitespace(&text);

    p.repeated_newlines
        .replace_all(&joined, "\n")
        .trim()
        .to_string()
}

fn collapse_whitespace(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Decode the handful of entities generated pages actually use
fn decode_entities(text: &str) -> String {
    // &amp; last so "&amp;lt;" stays literal "&lt;"
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&copy;", "©")
        .replace("&mdash;", "—")
        .replace("&ndash;", "–")
        .replace("&hellip;", "…")
        .replace("&amp;", "&")
}
