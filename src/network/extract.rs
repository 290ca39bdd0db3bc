//! Readable-text extraction from result pages

use scraper::Html;

/// Upper bound on extracted page text, in characters
pub const MAX_PAGE_CHARS: usize = 5000;

/// Elements whose text never counts as page content
const SKIPPED_ELEMENTS: &[&str] = &[
    "head", "script", "style", "noscript", "header", "footer", "nav",
];

/// Extract visible text from an HTML document
///
/// Each text node becomes one line with internal whitespace collapsed.
/// The result is truncated to `max_chars` characters.
pub fn extract_text(html: &str, max_chars: usize) -> String {
    let document = Html::parse_document(html);

    let mut lines = Vec::new();
    for node in document.tree.root().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };

        let skipped = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .map(|el| SKIPPED_ELEMENTS.contains(&el.name()))
                .unwrap_or(false)
        });
        if skipped {
            continue;
        }

        let line = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if !line.is_empty() {
            lines.push(line);
        }
    }

    truncate_chars(&lines.join("\n"), max_chars)
}

/// Truncate to at most `max_chars` characters on a char boundary
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
