//! Generated document normalisation and export

use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// File name used when exporting the current document
pub const EXPORT_FILE_NAME: &str = "website.html";

static OPENING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^```[\w+#.-]*").expect("valid fence regex"));

/// Remove one layer of markdown code fencing from already-trimmed text.
fn strip_once(text: &str) -> &str {
    let mut body = text;

    if let Some(fence) = OPENING_FENCE.find(body) {
        body = body[fence.end()..].trim_start();
    }
    if let Some(rest) = body.strip_suffix("```") {
        body = rest.trim_end();
    }

    body.trim()
}

/// Strip markdown code fences and surrounding whitespace from model output.
///
/// Models often wrap the document in a fenced block such as
/// "```html ... ```". Either fence may be missing. Stripping repeats until
/// nothing changes, so `strip_fence(&strip_fence(x)) == strip_fence(x)`.
pub fn strip_fence(text: &str) -> String {
    let mut current = text.trim();
    loop {
        let next = strip_once(current);
        if next.len() == current.len() {
            return next.to_string();
        }
        current = next;
    }
}

/// Write the document to `path`, creating parent directories as needed.
pub fn write_html(artifact: &str, path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, artifact)
}

/// Export the document as [`EXPORT_FILE_NAME`] inside `dir`.
pub fn export_html(artifact: &str, dir: &Path) -> io::Result<PathBuf> {
    let path = dir.join(EXPORT_FILE_NAME);
    write_html(artifact, &path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_language_tagged_fence() {
        let raw = "```html\n<html><body>Hi</body></html>\n```";
        assert_eq!(strip_fence(raw), "<html><body>Hi</body></html>");
    }

    #[test]
    fn test_strip_surrounding_whitespace() {
        let raw = "\n\n  ```html\n<html></html>\n```  \n";
        assert_eq!(strip_fence(raw), "<html></html>");
    }

    #[test]
    fn test_strip_opening_fence_only() {
        assert_eq!(strip_fence("```html\n<p>cut off"), "<p>cut off");
    }

    #[test]
    fn test_strip_closing_fence_only() {
        assert_eq!(strip_fence("<p>done</p>\n```"), "<p>done</p>");
    }

    #[test]
    fn test_strip_untagged_fence() {
        assert_eq!(strip_fence("```\n<div></div>\n```"), "<div></div>");
    }

    #[test]
    fn test_plain_document_untouched() {
        let doc = "<!DOCTYPE html>\n<html lang=\"en\"></html>";
        assert_eq!(strip_fence(doc), doc);
    }

    #[test]
    fn test_inner_backticks_kept() {
        let doc = "<pre>```rust\nfn main() {}\n```</pre>";
        assert_eq!(strip_fence(doc), doc);
    }

    #[test]
    fn test_strip_fence_is_idempotent() {
        let samples = [
            "",
            "   ",
            "```",
            "``````",
            "```html",
            "```html\n```js\ncode\n```\n```",
            "```html\n<html></html>\n```",
            "  ```\n  ```html\n<p/>\n```\n```  ",
            "<p>no fences</p>",
            "text ``` in the middle",
            "API error: request timed out",
            "````html\n<x>\n````",
        ];

        for sample in samples {
            let once = strip_fence(sample);
            assert_eq!(strip_fence(&once), once, "not idempotent for {:?}", sample);
        }
    }

    #[test]
    fn test_export_html_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = export_html("<html></html>", dir.path()).unwrap();

        assert_eq!(path, dir.path().join(EXPORT_FILE_NAME));
        assert_eq!(fs::read_to_string(path).unwrap(), "<html></html>");
    }

    #[test]
    fn test_write_html_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("site.html");
        write_html("<p>x</p>", &path).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "<p>x</p>");
    }
}
