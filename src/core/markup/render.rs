use super::html::{anchor, escape_attr, escape_html, linkify_html, looks_like_html};
use super::tokenizer::{tokenize, TokenKind};

pub const CARD_CLASS: &str = "product-card";
pub const GALLERY_CLASS: &str = "image-gallery";
pub const LINK_SEPARATOR: &str = " | ";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageBlock {
    pub url: String,
    pub alt: String,
}

impl ImageBlock {
    pub fn to_html(&self) -> String {
        format!(
            "<div class=\"image-wrap\"><img src=\"{}\" alt=\"{}\" loading=\"lazy\"></div>",
            escape_attr(&self.url),
            escape_attr(&self.alt)
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TitleBlock {
    pub title: String,
    pub description: String,
}

impl TitleBlock {
    fn to_html(&self) -> String {
        let mut html = format!(
            "<div class=\"product-info\"><h4 class=\"product-title\">{}</h4>",
            escape_html(&self.title)
        );
        if !self.description.is_empty() {
            html.push_str(&format!(
                "<p class=\"product-desc\">{}</p>",
                escape_html(&self.description)
            ));
        }
        html.push_str("</div>");
        html
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Anchor {
    pub label: String,
    pub url: String,
}

/// The rich part of a reply, ready to be inserted after the message row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenderFragment {
    Card {
        images: Vec<ImageBlock>,
        title: Option<TitleBlock>,
        links: Vec<Anchor>,
    },
    /// Backend-formatted HTML with bare URLs already linkified.
    Passthrough(String),
}

impl RenderFragment {
    pub fn to_html(&self) -> String {
        match self {
            RenderFragment::Card { images, .. } => {
                let gallery: String = images.iter().map(ImageBlock::to_html).collect();
                self.card_html(&gallery)
            }
            RenderFragment::Passthrough(html) => html.clone(),
        }
    }

    /// The card with an empty gallery container, for batched image insertion.
    pub fn shell_html(&self) -> String {
        match self {
            RenderFragment::Card { .. } => self.card_html(""),
            RenderFragment::Passthrough(html) => html.clone(),
        }
    }

    pub fn gallery(&self) -> &[ImageBlock] {
        match self {
            RenderFragment::Card { images, .. } => images,
            RenderFragment::Passthrough(_) => &[],
        }
    }

    pub fn has_gallery(&self) -> bool {
        !self.gallery().is_empty()
    }

    fn card_html(&self, gallery_html: &str) -> String {
        let RenderFragment::Card {
            images,
            title,
            links,
        } = self
        else {
            return String::new();
        };

        let mut body = String::new();
        if !images.is_empty() {
            body.push_str(&format!(
                "<div class=\"{GALLERY_CLASS}\">{gallery_html}</div>"
            ));
        } else if let Some(title) = title {
            body.push_str(&title.to_html());
        }

        if !links.is_empty() {
            let row = links
                .iter()
                .map(|link| anchor(&link.url, &link.label))
                .collect::<Vec<_>>()
                .join(LINK_SEPARATOR);
            body.push_str(&format!("<div class=\"product-links\">{row}</div>"));
        }

        if body.is_empty() {
            return body;
        }
        format!("<div class=\"{CARD_CLASS}\">{body}</div>")
    }

    fn is_empty(&self) -> bool {
        match self {
            RenderFragment::Card {
                images,
                title,
                links,
            } => images.is_empty() && title.is_none() && links.is_empty(),
            RenderFragment::Passthrough(html) => html.trim().is_empty(),
        }
    }
}

/// Build the fragment for `markup`. Returns `None` when nothing would render.
pub fn parse_fragment(markup: &str) -> Option<RenderFragment> {
    if markup.trim().is_empty() {
        return None;
    }

    if looks_like_html(markup) {
        return Some(RenderFragment::Passthrough(wrap_card(&linkify_html(markup))));
    }

    let mut images = Vec::new();
    let mut links = Vec::new();
    let mut text = String::new();

    for token in tokenize(markup) {
        match token.kind {
            TokenKind::Text => text.push_str(token.text(markup)),
            TokenKind::Image { alt, url } => images.push(ImageBlock { url, alt }),
            TokenKind::Link { label, url } => {
                let label = if label.trim().is_empty() {
                    url.clone()
                } else {
                    label.trim().to_string()
                };
                links.push(Anchor { label, url });
            }
            TokenKind::BareUrl { url } => links.push(Anchor {
                label: url.clone(),
                url,
            }),
        }
    }

    let title = if images.is_empty() {
        title_block(&text)
    } else {
        None
    };

    let fragment = RenderFragment::Card {
        images,
        title,
        links,
    };
    (!fragment.is_empty()).then_some(fragment)
}

/// Parse the markup part of a reply into an HTML fragment.
pub fn parse(markup: &str) -> String {
    parse_fragment(markup)
        .map(|fragment| fragment.to_html())
        .unwrap_or_default()
}

fn title_block(text: &str) -> Option<TitleBlock> {
    let mut lines = text
        .trim()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty());
    let title = lines.next()?.to_string();
    let description = lines.collect::<Vec<_>>().join(" ");
    Some(TitleBlock { title, description })
}

fn wrap_card(html: &str) -> String {
    let trimmed = html.trim_start();
    let already_wrapped = [
        format!("<div class=\"{CARD_CLASS}\""),
        format!("<div class='{CARD_CLASS}'"),
    ]
    .iter()
    .any(|prefix| trimmed.starts_with(prefix.as_str()));

    if already_wrapped {
        html.to_string()
    } else {
        format!("<div class=\"{CARD_CLASS}\">{html}</div>")
    }
}
