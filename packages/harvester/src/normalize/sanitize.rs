//! Description markup cleanup.
//!
//! Walks the parsed fragment and re-serializes it, dropping non-content
//! subtrees and presentational attributes. Text is collected from the same
//! walk so `clean_text` and `sanitize_html` agree on what counts as content.

use scraper::{ElementRef, Html, Node};

/// Subtrees removed entirely.
const DROPPED_TAGS: [&str; 4] = ["script", "style", "noscript", "iframe"];

/// Attributes removed from every element (plus any `data-*`).
const DROPPED_ATTRS: [&str; 3] = ["class", "id", "style"];

const VOID_TAGS: [&str; 13] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Sanitized markup, or `None` if nothing is left.
pub fn sanitize_html(html: &str) -> Option<String> {
    let fragment = Html::parse_fragment(html);
    let mut out = String::with_capacity(html.len());
    write_children(fragment.root_element(), &mut out);

    let out = out.trim();
    (!out.is_empty()).then(|| out.to_string())
}

/// Plain text of `html` with whitespace runs collapsed, or `None` if empty.
pub fn clean_text(html: &str) -> Option<String> {
    let fragment = Html::parse_fragment(html);
    let mut raw = String::new();
    collect_text(fragment.root_element(), &mut raw);

    let text = collapse_whitespace(&raw);
    (!text.is_empty()).then_some(text)
}

fn is_dropped(element: &ElementRef<'_>) -> bool {
    DROPPED_TAGS.contains(&element.value().name())
}

fn write_children(parent: ElementRef<'_>, out: &mut String) {
    for child in parent.children() {
        match child.value() {
            Node::Text(text) => push_escaped(out, text, false),
            Node::Element(_) => {
                if let Some(element) = ElementRef::wrap(child) {
                    write_element(element, out);
                }
            }
            _ => {}
        }
    }
}

fn write_element(element: ElementRef<'_>, out: &mut String) {
    if is_dropped(&element) {
        return;
    }

    let name = element.value().name();
    out.push('<');
    out.push_str(name);
    for (attr, value) in element.value().attrs() {
        if DROPPED_ATTRS.contains(&attr) || attr.starts_with("data-") {
            continue;
        }
        out.push(' ');
        out.push_str(attr);
        out.push_str("=\"");
        push_escaped(out, value, true);
        out.push('"');
    }
    out.push('>');

    if VOID_TAGS.contains(&name) {
        return;
    }

    write_children(element, out);
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn collect_text(parent: ElementRef<'_>, out: &mut String) {
    for child in parent.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                if let Some(element) = ElementRef::wrap(child) {
                    if !is_dropped(&element) {
                        collect_text(element, out);
                    }
                }
            }
            _ => {}
        }
    }
}

fn push_escaped(out: &mut String, text: &str, in_attribute: bool) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '"' if in_attribute => out.push_str("&quot;"),
            '<' if !in_attribute => out.push_str("&lt;"),
            '>' if !in_attribute => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_scripts_and_presentational_attrs() {
        let html = r#"<div class="x" data-y="1"><script>evil()</script>Hello</div>"#;
        assert_eq!(sanitize_html(html).as_deref(), Some("<div>Hello</div>"));
        assert_eq!(clean_text(html).as_deref(), Some("Hello"));
    }

    #[test]
    fn test_keeps_content_attributes_and_void_tags() {
        let html = r#"<p id="a" style="color:red">Go <a href="https://x.test/?a=1&amp;b=2" data-track="1">here</a><br></p>"#;
        assert_eq!(
            sanitize_html(html).as_deref(),
            Some(r#"<p>Go <a href="https://x.test/?a=1&amp;b=2">here</a><br></p>"#)
        );
    }

    #[test]
    fn test_text_collapses_whitespace_and_skips_dropped_tags() {
        let html = "<ul>\n  <li>Rust</li>\n  <li>Tokio</li>\n</ul><style>.a{}</style><noscript>js</noscript><iframe></iframe>";
        assert_eq!(clean_text(html).as_deref(), Some("Rust Tokio"));
    }

    #[test]
    fn test_empty_results_are_none() {
        assert_eq!(sanitize_html(""), None);
        assert_eq!(sanitize_html("<script>only()</script>"), None);
        assert_eq!(clean_text("<p>   </p>"), None);
    }

    #[test]
    fn test_text_is_escaped_on_output() {
        assert_eq!(
            sanitize_html("<p>1 &lt; 2 &amp; 3</p>").as_deref(),
            Some("<p>1 &lt; 2 &amp; 3</p>")
        );
    }
}
