//! Small query layer over a parsed HTML document.
//!
//! Selectors are standard CSS with two extra suffixes:
//!
//! - `@text` selects the first text node directly inside the matched element
//! - `@after` selects the node right after the matched element
//!
//! ```rust,ignore
//! // <td><b>Size:</b> 1.5 GB</td>
//! let size = selector_text(row, "td b@after"); // "1.5 GB"
//! ```

use scraper::{ElementRef, Node, Selector};

const TEXT_NODE_SUFFIX: &str = "@text";
const AFTER_NODE_SUFFIX: &str = "@after";

/// Soft hyphen (`&shy;`), invisible on the page but present in the text.
const SOFT_HYPHEN: char = '\u{00ad}';

enum Extract {
    Subtree,
    FirstTextNode,
    NextSibling,
}

/// Remove invisible soft hyphens and surrounding whitespace.
pub fn sanitize_text(text: &str) -> String {
    text.replace(SOFT_HYPHEN, "").trim().to_string()
}

/// Sanitized text of the whole subtree of `element`.
pub fn element_text(element: ElementRef<'_>) -> String {
    sanitize_text(&element.text().collect::<String>())
}

/// Parse a selector, logging and returning `None` when it is malformed.
pub fn parse_selector(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::debug!("Invalid selector {:?}: {}", selector, e);
            None
        }
    }
}

/// First element under `root` matching `selector`.
pub fn select_first<'a>(root: ElementRef<'a>, selector: &str) -> Option<ElementRef<'a>> {
    let parsed = parse_selector(selector)?;
    root.select(&parsed).next()
}

/// Whether any element under `root` matches `selector`.
pub fn has_match(root: ElementRef<'_>, selector: &str) -> bool {
    select_first(root, selector).is_some()
}

/// Extract text from the first element matching `selector`, honoring the
/// `@text` / `@after` suffixes. Returns an empty string when nothing matches.
pub fn selector_text(root: ElementRef<'_>, selector: &str) -> String {
    let (selector, extract) = if let Some(s) = selector.strip_suffix(TEXT_NODE_SUFFIX) {
        (s, Extract::FirstTextNode)
    } else if let Some(s) = selector.strip_suffix(AFTER_NODE_SUFFIX) {
        (s, Extract::NextSibling)
    } else {
        (selector, Extract::Subtree)
    };

    let Some(element) = select_first(root, selector) else {
        return String::new();
    };

    match extract {
        Extract::Subtree => element_text(element),
        Extract::FirstTextNode => element
            .children()
            .find_map(|node| match node.value() {
                Node::Text(text) => Some(sanitize_text(text)),
                _ => None,
            })
            .unwrap_or_default(),
        Extract::NextSibling => element
            .next_sibling()
            .map(|node| match node.value() {
                Node::Text(text) => sanitize_text(text),
                Node::Element(_) => ElementRef::wrap(node).map(element_text).unwrap_or_default(),
                _ => String::new(),
            })
            .unwrap_or_default(),
    }
}
