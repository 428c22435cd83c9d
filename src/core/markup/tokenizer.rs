use std::ops::Range;

use super::html::{bare_url_len, is_safe_url};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Text,
    Image { alt: String, url: String },
    Link { label: String, url: String },
    BareUrl { url: String },
}

/// One lexical unit of the markup part. `span` is a byte range into the
/// tokenized input; tokens cover the input without gaps or overlap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Range<usize>,
}

impl Token {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.span.clone()]
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, TokenKind::Text)
    }
}

struct Directive<'a> {
    label: &'a str,
    url: &'a str,
    end: usize,
}

/// Scan `input` left to right.
///
/// At each position the alternatives are tried in priority order: image
/// `![alt](url)`, link `[label](url)`, bare `http(s)://` URL. Anything else
/// extends the current text run.
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut text_start: Option<usize> = None;
    let mut pos = 0;

    while pos < input.len() {
        let tail = &input[pos..];
        let matched = match_at(input, pos);

        match matched {
            Some((kind, end)) => {
                if let Some(start) = text_start.take() {
                    tokens.push(Token {
                        kind: TokenKind::Text,
                        span: start..pos,
                    });
                }
                tokens.push(Token {
                    kind,
                    span: pos..end,
                });
                pos = end;
            }
            None => {
                text_start.get_or_insert(pos);
                pos += tail.chars().next().map_or(1, char::len_utf8);
            }
        }
    }

    if let Some(start) = text_start {
        tokens.push(Token {
            kind: TokenKind::Text,
            span: start..input.len(),
        });
    }

    tokens
}

/// Try each alternative at `pos`, highest priority first.
fn match_at(input: &str, pos: usize) -> Option<(TokenKind, usize)> {
    let tail = &input[pos..];

    if tail.starts_with("![") {
        if let Some(d) = scan_directive(input, pos + 1) {
            let kind = TokenKind::Image {
                alt: d.label.to_string(),
                url: d.url.to_string(),
            };
            return Some((kind, d.end));
        }
    }

    if tail.starts_with('[') {
        if let Some(d) = scan_directive(input, pos) {
            let kind = TokenKind::Link {
                label: d.label.to_string(),
                url: d.url.to_string(),
            };
            return Some((kind, d.end));
        }
    }

    bare_url_len(tail).map(|len| {
        let kind = TokenKind::BareUrl {
            url: tail[..len].to_string(),
        };
        (kind, pos + len)
    })
}

/// Parse `[label](url)` where `open` is the index of `[`.
fn scan_directive(input: &str, open: usize) -> Option<Directive<'_>> {
    let rest = input.get(open + 1..)?;
    let close = rest.find([']', '[', '\n'])?;
    if rest.as_bytes()[close] != b']' {
        return None;
    }
    let label = &rest[..close];

    let target = rest[close + 1..].strip_prefix('(')?;
    let url_end = target.find(|c: char| c == ')' || c.is_whitespace())?;
    if target.as_bytes()[url_end] != b')' {
        return None;
    }
    let url = &target[..url_end];
    if !is_safe_url(url) {
        return None;
    }

    // '[' + label + "](" + url + ')'
    let end = open + 1 + close + 2 + url_end + 1;
    Some(Directive { label, url, end })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn plain_text_is_a_single_run() {
        let tokens = tokenize("just words, no links");
        assert_eq!(tokens.len(), 1);
        assert!(tokens[0].is_text());
        assert_eq!(tokens[0].span, 0..20);
    }

    #[test]
    fn image_takes_priority_over_link() {
        assert_eq!(
            kinds("![cat](https://x/cat.png)"),
            vec![TokenKind::Image {
                alt: "cat".into(),
                url: "https://x/cat.png".into()
            }]
        );
    }

    #[test]
    fn directive_url_wins_over_bare_url() {
        let tokens = tokenize("[doc](http://a/doc)");
        assert_eq!(tokens.len(), 1);
        assert_eq!(
            tokens[0].kind,
            TokenKind::Link {
                label: "doc".into(),
                url: "http://a/doc".into()
            }
        );
    }

    #[test]
    fn mixed_input_partitions_in_order() {
        let input = "see [doc](http://a) and http://b.";
        let tokens = tokenize(input);
        let texts: Vec<&str> = tokens.iter().map(|t| t.text(input)).collect();
        assert_eq!(texts, vec!["see ", "[doc](http://a)", " and ", "http://b", "."]);
        assert!(matches!(tokens[3].kind, TokenKind::BareUrl { ref url } if url == "http://b"));
    }

    #[test]
    fn malformed_directives_fall_back_to_text_and_urls() {
        let input = "[broken(http://a.b/x) ![nope] [x](";
        let tokens = tokenize(input);
        let urls: Vec<&TokenKind> = tokens
            .iter()
            .filter(|t| !t.is_text())
            .map(|t| &t.kind)
            .collect();
        assert_eq!(
            urls,
            vec![&TokenKind::BareUrl {
                url: "http://a.b/x".into()
            }]
        );
        let rebuilt: String = tokens.iter().map(|t| t.text(input)).collect();
        assert_eq!(rebuilt, input);
    }

    #[test]
    fn unsafe_scheme_is_not_a_directive() {
        let input = "[click](javascript:alert(1))";
        let tokens = tokenize(input);
        assert!(tokens.iter().all(Token::is_text));
    }

    #[test]
    fn spans_cover_multibyte_input() {
        let input = "Tranh đẹp ![ảnh](https://cgi.vn/a.png) – xem https://cgi.vn/ar/1 nhé";
        let tokens = tokenize(input);
        let mut cursor = 0;
        for token in &tokens {
            assert_eq!(token.span.start, cursor);
            cursor = token.span.end;
        }
        assert_eq!(cursor, input.len());
        let rebuilt: String = tokens.iter().map(|t| t.text(input)).collect();
        assert_eq!(rebuilt, input);
    }

    #[test]
    fn empty_alt_is_allowed() {
        assert_eq!(
            kinds("![](/img/a.png)"),
            vec![TokenKind::Image {
                alt: String::new(),
                url: "/img/a.png".into()
            }]
        );
    }
}
