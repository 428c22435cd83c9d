use regex::Regex;
use std::sync::LazyLock;

/// Tags that mark a reply as already formatted by the backend.
static HTML_SNIFF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)</?(?:div|span|p|a|img|ul|ol|li|table|thead|tbody|tr|td|th|h[1-6]|br|hr|strong|em|b|i|section|article|figure|figcaption)\b[^<>]*>",
    )
    .expect("html sniff pattern is valid")
});

/// Elements that are never copied through verbatim, even from pre-rendered HTML.
const NEUTRALIZED_TAGS: &[&str] = &["script", "style", "iframe", "object", "embed"];

const URL_SCHEMES: &[&str] = &["https://", "http://"];

pub const LINK_TARGET_ATTRS: &str = r#"target="_blank" rel="noopener noreferrer""#;

/// Escape text placed between tags.
pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape a value placed inside a double-quoted attribute.
///
/// Newlines and tabs are encoded too so an attribute never spans lines.
pub fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' => out.push_str("&#9;"),
            _ => out.push_str(&escape_html(ch.encode_utf8(&mut [0; 4]))),
        }
    }
    out
}

pub fn looks_like_html(input: &str) -> bool {
    HTML_SNIFF.is_match(input)
}

/// Only `http`/`https` and scheme-less (relative) URLs may end up in `href`/`src`.
pub fn is_safe_url(url: &str) -> bool {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return false;
    }
    let scheme_end = trimmed.find(|c: char| matches!(c, ':' | '/' | '?' | '#'));
    match scheme_end {
        Some(idx) if trimmed.as_bytes()[idx] == b':' => {
            let scheme = trimmed[..idx].to_ascii_lowercase();
            scheme == "http" || scheme == "https"
        }
        _ => true,
    }
}

/// Length in bytes of the bare URL at the start of `text`, if any.
pub fn bare_url_len(text: &str) -> Option<usize> {
    let scheme = URL_SCHEMES.iter().find(|scheme| {
        text.get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    })?;

    let body = &text[scheme.len()..];
    let raw_end = body
        .find(|c: char| {
            c.is_whitespace() || matches!(c, '<' | '>' | '"' | '\'' | '(' | ')' | '[' | ']')
        })
        .unwrap_or(body.len());
    let trimmed = body[..raw_end].trim_end_matches(['.', ',', ';', ':', '!', '?']);
    if trimmed.is_empty() {
        return None;
    }
    Some(scheme.len() + trimmed.len())
}

pub fn anchor(href: &str, label: &str) -> String {
    format!(
        "<a href=\"{}\" {}>{}</a>",
        escape_attr(href),
        LINK_TARGET_ATTRS,
        escape_html(label)
    )
}

/// Convert bare URLs found in the text nodes of pre-rendered HTML into anchors.
///
/// Tags and attribute values are copied as they are. Text inside an existing
/// `<a>` element is left alone. The input is already HTML, so URL text is
/// reused without another round of escaping.
pub fn linkify_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 64);
    let mut anchor_depth = 0usize;
    let mut pos = 0;

    while pos < input.len() {
        let tail = &input[pos..];

        if tail.starts_with('<') {
            if let Some(end) = tag_end(tail) {
                let tag = &tail[..=end];
                match tag_name(tag) {
                    Some((name, _)) if NEUTRALIZED_TAGS.contains(&name.as_str()) => {
                        out.push_str(&escape_html(tag));
                    }
                    Some((name, closing)) => {
                        if name == "a" {
                            if closing {
                                anchor_depth = anchor_depth.saturating_sub(1);
                            } else if !tag.ends_with("/>") {
                                anchor_depth += 1;
                            }
                        }
                        out.push_str(tag);
                    }
                    None => out.push_str(tag),
                }
                pos += end + 1;
                continue;
            }
            // An unterminated tag would be closed by whatever markup follows.
            if opens_tag(tail) {
                out.push_str("&lt;");
                pos += 1;
                continue;
            }
        }

        if anchor_depth == 0 {
            if let Some(len) = bare_url_len(tail) {
                let url = &tail[..len];
                out.push_str(&format!("<a href=\"{url}\" {LINK_TARGET_ATTRS}>{url}</a>"));
                pos += len;
                continue;
            }
        }

        let Some(ch) = tail.chars().next() else {
            break;
        };
        out.push(ch);
        pos += ch.len_utf8();
    }

    out
}

/// Index of the `>` closing the tag that starts at `tail[0]`, skipping quoted
/// attribute values.
fn tag_end(tail: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (idx, ch) in tail.char_indices().skip(1) {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, '<') => return None,
            (None, '>') => return Some(idx),
            _ => {}
        }
    }
    None
}

/// Whether `tail` starts like a start or end tag (`<x`, `</x`).
fn opens_tag(tail: &str) -> bool {
    let Some(rest) = tail.strip_prefix('<') else {
        return false;
    };
    let rest = rest.strip_prefix('/').unwrap_or(rest);
    rest.starts_with(|c: char| c.is_ascii_alphabetic())
}

/// Lowercased element name and whether the tag is a closing tag.
fn tag_name(tag: &str) -> Option<(String, bool)> {
    let inner = tag.strip_prefix('<')?.trim_start();
    let (closing, inner) = match inner.strip_prefix('/') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, inner),
    };
    let name: String = inner
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();
    if name.is_empty() {
        return None;
    }
    Some((name.to_ascii_lowercase(), closing))
}
