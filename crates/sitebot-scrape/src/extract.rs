//! Readable-text extraction and contact mining for scraped pages.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node};
use std::collections::HashSet;

use sitebot_schema::ContactInfo;

/// Subtrees that never contain readable page copy.
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "nav", "footer"];

/// A line must be strictly longer than this (after trimming) to be kept.
const MIN_LINE_CHARS: usize = 25;
const MAX_LINES: usize = 50;
const MAX_CONTENT_CHARS: usize = 4000;
const MAX_CONTACTS: usize = 3;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("email regex")
});

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\+?\d[\d\s.\-]{7,}\d").expect("phone regex"));

/// Extract the readable text of an HTML document as filtered lines: each
/// text node becomes a candidate line, lines of ≤25 trimmed chars are
/// dropped, at most the first 50 survive, and the joined result is capped
/// at 4000 chars. Returns `None` when no line qualifies, which callers
/// treat as "no page".
pub fn extract_page_text(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    let mut chunks = Vec::new();
    collect_text(doc.root_element(), &mut chunks);

    let lines: Vec<&str> = chunks
        .iter()
        .map(|chunk| chunk.as_str())
        .filter(|line| line.chars().count() > MIN_LINE_CHARS)
        .take(MAX_LINES)
        .collect();

    if lines.is_empty() {
        return None;
    }

    let joined = lines.join("\n");
    if joined.chars().count() > MAX_CONTENT_CHARS {
        Some(joined.chars().take(MAX_CONTENT_CHARS).collect())
    } else {
        Some(joined)
    }
}

fn collect_text(element: ElementRef<'_>, out: &mut Vec<String>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    out.push(trimmed.to_string());
                }
            }
            Node::Element(el) => {
                if SKIPPED_ELEMENTS.contains(&el.name()) {
                    continue;
                }
                if let Some(el_ref) = ElementRef::wrap(child) {
                    collect_text(el_ref, out);
                }
            }
            _ => {}
        }
    }
}

/// Mine unique email addresses and phone-like digit sequences from the
/// concatenated page text, in first-seen order, capped at three each.
pub fn mine_contacts(text: &str) -> ContactInfo {
    ContactInfo {
        emails: unique_matches(&EMAIL_RE, text),
        phones: unique_matches(&PHONE_RE, text),
    }
}

fn unique_matches(re: &Regex, text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut values = Vec::new();
    for m in re.find_iter(text) {
        let value = m.as_str().to_string();
        if seen.insert(value.clone()) {
            values.push(value);
            if values.len() == MAX_CONTACTS {
                break;
            }
        }
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_lines_are_dropped() {
        let html = "<html><body>\
            <p>short</p>\
            <p>this line is definitely longer than twenty-five characters</p>\
            </body></html>";
        let text = extract_page_text(html).expect("one qualifying line");
        assert_eq!(
            text,
            "this line is definitely longer than twenty-five characters"
        );
    }

    #[test]
    fn page_with_no_qualifying_lines_yields_none() {
        let html = "<html><body><p>tiny</p><div>also tiny</div></body></html>";
        assert!(extract_page_text(html).is_none());
    }

    #[test]
    fn skipped_subtrees_contribute_nothing() {
        let html = "<html><body>\
            <script>var definitely_long_enough_to_pass_the_filter = 1;</script>\
            <style>.definitely-long-enough-to-pass { color: #fff; }</style>\
            <nav>navigation entry that is much longer than the minimum</nav>\
            <footer>footer boilerplate that is much longer than the minimum</footer>\
            <p>actual page copy that survives the boilerplate stripping</p>\
            </body></html>";
        let text = extract_page_text(html).expect("body copy kept");
        assert_eq!(
            text,
            "actual page copy that survives the boilerplate stripping"
        );
    }

    #[test]
    fn nested_content_inside_skipped_subtree_is_dropped() {
        let html = "<html><body>\
            <nav><ul><li>a navigation item that is longer than twenty-five chars</li></ul></nav>\
            <p>kept paragraph with enough characters to pass the filter</p>\
            </body></html>";
        let text = extract_page_text(html).expect("paragraph kept");
        assert!(!text.contains("navigation item"));
        assert!(text.contains("kept paragraph"));
    }

    #[test]
    fn line_count_is_capped_at_fifty() {
        let mut body = String::new();
        for i in 0..80 {
            body.push_str(&format!(
                "<p>paragraph number {i:03} padded out well past the line minimum</p>"
            ));
        }
        let html = format!("<html><body>{body}</body></html>");
        let text = extract_page_text(&html).expect("lines kept");
        assert_eq!(text.lines().count(), 50);
        assert!(text.contains("paragraph number 000"));
        assert!(!text.contains("paragraph number 051"));
    }

    #[test]
    fn content_is_truncated_to_four_thousand_chars() {
        let long_line = "x".repeat(200);
        let mut body = String::new();
        for _ in 0..40 {
            body.push_str(&format!("<p>{long_line}</p>"));
        }
        let html = format!("<html><body>{body}</body></html>");
        let text = extract_page_text(&html).expect("content kept");
        assert_eq!(text.chars().count(), 4000);
    }

    #[test]
    fn emails_are_deduplicated_and_capped() {
        let text = "reach us: a@example.com b@example.com a@example.com \
                    c@example.com d@example.com";
        let contacts = mine_contacts(text);
        assert_eq!(
            contacts.emails,
            vec!["a@example.com", "b@example.com", "c@example.com"]
        );
    }

    #[test]
    fn phones_match_separator_formats() {
        let text = "call +1 555 123 4567 or 020-7946-0958 today";
        let contacts = mine_contacts(text);
        assert_eq!(contacts.phones.len(), 2);
        assert_eq!(contacts.phones[0], "+1 555 123 4567");
    }

    #[test]
    fn short_digit_runs_are_not_phones() {
        let contacts = mine_contacts("our team of 12 serves 345 clients");
        assert!(contacts.phones.is_empty());
    }

    #[test]
    fn plain_text_without_contacts_yields_empty_info() {
        let contacts = mine_contacts("nothing to see here");
        assert!(contacts.is_empty());
    }
}
