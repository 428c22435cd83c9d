//! The display surface a reveal writes into.
//!
//! A browser would back this with DOM nodes; [`HtmlTranscript`] keeps an
//! in-memory document instead, which the CLI writes out and tests inspect.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::future::{self, BoxFuture, FutureExt};

use crate::core::markup::{escape_html, ImageBlock, GALLERY_CLASS};
use crate::core::message::SenderLabel;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FragmentId(pub u64);

/// Resolves once every image of a gallery batch has loaded or failed to load.
pub type BatchSettle = BoxFuture<'static, ()>;

pub fn settled() -> BatchSettle {
    future::ready(()).boxed()
}

pub trait MessageSink: Send {
    /// Append a message row with an empty text target.
    fn append_row(&mut self, sender: &SenderLabel) -> RowId;

    /// Append already-escaped HTML text to a row's text target.
    fn append_text(&mut self, row: RowId, escaped: &str);

    /// Insert an HTML fragment directly after `row`.
    fn insert_after(&mut self, row: RowId, html: &str) -> FragmentId;

    /// Append an HTML fragment at the end of the panel.
    fn append_fragment(&mut self, html: &str) -> FragmentId;

    /// Append image blocks to a fragment's gallery container.
    fn append_gallery_batch(&mut self, fragment: FragmentId, images: &[ImageBlock])
        -> BatchSettle;

    fn scroll_to_bottom(&mut self);

    /// Whether the row is still part of the panel. Reveals targeting a
    /// detached row stop at their next tick.
    fn is_attached(&self, row: RowId) -> bool;
}

pub type SharedSink<S> = Arc<Mutex<S>>;

pub fn shared<S: MessageSink>(sink: S) -> SharedSink<S> {
    Arc::new(Mutex::new(sink))
}

/// Lock a shared sink, recovering the guard if another writer panicked.
pub fn lock_sink<S: ?Sized>(sink: &Mutex<S>) -> MutexGuard<'_, S> {
    sink.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranscriptRow {
    pub id: RowId,
    pub sender: SenderLabel,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranscriptFragment {
    pub id: FragmentId,
    pub html: String,
    pub gallery: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TranscriptNode {
    Row(TranscriptRow),
    Fragment(TranscriptFragment),
}

/// In-memory chat panel. Images settle as soon as they are appended.
#[derive(Debug, Default)]
pub struct HtmlTranscript {
    nodes: Vec<TranscriptNode>,
    next_id: u64,
    scrolls: usize,
}

impl HtmlTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn fragment_node(&mut self, html: &str) -> (FragmentId, TranscriptNode) {
        let id = FragmentId(self.next_id());
        let node = TranscriptNode::Fragment(TranscriptFragment {
            id,
            html: html.to_string(),
            gallery: Vec::new(),
        });
        (id, node)
    }

    pub fn nodes(&self) -> &[TranscriptNode] {
        &self.nodes
    }

    pub fn rows(&self) -> impl Iterator<Item = &TranscriptRow> {
        self.nodes.iter().filter_map(|node| match node {
            TranscriptNode::Row(row) => Some(row),
            TranscriptNode::Fragment(_) => None,
        })
    }

    pub fn fragments(&self) -> impl Iterator<Item = &TranscriptFragment> {
        self.nodes.iter().filter_map(|node| match node {
            TranscriptNode::Fragment(fragment) => Some(fragment),
            TranscriptNode::Row(_) => None,
        })
    }

    pub fn row_text(&self, row: RowId) -> Option<&str> {
        self.rows()
            .find(|candidate| candidate.id == row)
            .map(|candidate| candidate.text.as_str())
    }

    pub fn scroll_count(&self) -> usize {
        self.scrolls
    }

    /// Remove a row and the fragments that directly follow it.
    pub fn remove_row(&mut self, row: RowId) -> bool {
        let Some(start) = self
            .nodes
            .iter()
            .position(|node| matches!(node, TranscriptNode::Row(r) if r.id == row))
        else {
            return false;
        };
        let end = self.nodes[start + 1..]
            .iter()
            .position(|node| matches!(node, TranscriptNode::Row(_)))
            .map_or(self.nodes.len(), |offset| start + 1 + offset);
        self.nodes.drain(start..end);
        true
    }

    /// Render the panel as HTML.
    pub fn to_html(&self) -> String {
        let mut html = String::from("<div id=\"chat-box\">\n");
        for node in &self.nodes {
            match node {
                TranscriptNode::Row(row) => {
                    let class = row.sender.role.css_class();
                    html.push_str(&format!(
                        concat!(
                            "<div class=\"chat-row {class}\">",
                            "<div class=\"chat-bubble {class}\"><strong>{label}:</strong> ",
                            "<span class=\"typing-text\">{text}</span></div></div>\n"
                        ),
                        class = class,
                        label = escape_html(&row.sender.display),
                        text = row.text
                    ));
                }
                TranscriptNode::Fragment(fragment) => {
                    html.push_str("<div class=\"bot-html\">");
                    html.push_str(&fill_gallery(&fragment.html, &fragment.gallery));
                    html.push_str("</div>\n");
                }
            }
        }
        html.push_str("</div>\n");
        html
    }
}

/// Place gallery items into the empty gallery container of a card shell.
fn fill_gallery(shell: &str, gallery: &[String]) -> String {
    let container = format!("<div class=\"{GALLERY_CLASS}\"></div>");
    if gallery.is_empty() || !shell.contains(&container) {
        return shell.to_string();
    }
    let filled = format!("<div class=\"{GALLERY_CLASS}\">{}</div>", gallery.concat());
    shell.replacen(&container, &filled, 1)
}

impl MessageSink for HtmlTranscript {
    fn append_row(&mut self, sender: &SenderLabel) -> RowId {
        let id = RowId(self.next_id());
        self.nodes.push(TranscriptNode::Row(TranscriptRow {
            id,
            sender: sender.clone(),
            text: String::new(),
        }));
        id
    }

    fn append_text(&mut self, row: RowId, escaped: &str) {
        for node in &mut self.nodes {
            if let TranscriptNode::Row(candidate) = node {
                if candidate.id == row {
                    candidate.text.push_str(escaped);
                    return;
                }
            }
        }
    }

    fn insert_after(&mut self, row: RowId, html: &str) -> FragmentId {
        let (id, fragment) = self.fragment_node(html);
        match self
            .nodes
            .iter()
            .position(|node| matches!(node, TranscriptNode::Row(r) if r.id == row))
        {
            Some(index) => self.nodes.insert(index + 1, fragment),
            None => self.nodes.push(fragment),
        }
        id
    }

    fn append_fragment(&mut self, html: &str) -> FragmentId {
        let (id, fragment) = self.fragment_node(html);
        self.nodes.push(fragment);
        id
    }

    fn append_gallery_batch(
        &mut self,
        fragment: FragmentId,
        images: &[ImageBlock],
    ) -> BatchSettle {
        for node in &mut self.nodes {
            if let TranscriptNode::Fragment(candidate) = node {
                if candidate.id == fragment {
                    candidate
                        .gallery
                        .extend(images.iter().map(ImageBlock::to_html));
                    break;
                }
            }
        }
        settled()
    }

    fn scroll_to_bottom(&mut self) {
        self.scrolls += 1;
    }

    fn is_attached(&self, row: RowId) -> bool {
        self.rows().any(|candidate| candidate.id == row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::SenderLabel;

    #[test]
    fn fragments_land_right_after_their_row() {
        let mut transcript = HtmlTranscript::new();
        let first = transcript.append_row(&SenderLabel::bot("Bot"));
        let second = transcript.append_row(&SenderLabel::user("You"));
        transcript.insert_after(first, "<p>card</p>");

        let kinds: Vec<&str> = transcript
            .nodes()
            .iter()
            .map(|node| match node {
                TranscriptNode::Row(_) => "row",
                TranscriptNode::Fragment(_) => "fragment",
            })
            .collect();
        assert_eq!(kinds, vec!["row", "fragment", "row"]);
        assert!(transcript.is_attached(second));

        transcript.append_fragment("<p>tail</p>");
        assert!(matches!(
            transcript.nodes().last(),
            Some(TranscriptNode::Fragment(fragment)) if fragment.html == "<p>tail</p>"
        ));
    }

    #[test]
    fn removing_a_row_detaches_it_and_its_fragments() {
        let mut transcript = HtmlTranscript::new();
        let row = transcript.append_row(&SenderLabel::bot("Bot"));
        transcript.insert_after(row, "<p>card</p>");
        let other = transcript.append_row(&SenderLabel::user("You"));

        assert!(transcript.remove_row(row));
        assert!(!transcript.is_attached(row));
        assert!(transcript.is_attached(other));
        assert_eq!(transcript.fragments().count(), 0);
        assert!(!transcript.remove_row(row));
    }

    #[test]
    fn gallery_batches_fill_the_shell() {
        let mut transcript = HtmlTranscript::new();
        let row = transcript.append_row(&SenderLabel::bot("Bot"));
        let fragment = transcript.insert_after(
            row,
            "<div class=\"product-card\"><div class=\"image-gallery\"></div></div>",
        );
        let image = ImageBlock {
            url: "http://x/1.png".into(),
            alt: "one".into(),
        };
        drop(transcript.append_gallery_batch(fragment, std::slice::from_ref(&image)));

        let html = transcript.to_html();
        assert!(html.contains(&format!(
            "<div class=\"image-gallery\">{}</div>",
            image.to_html()
        )));
    }

    #[test]
    fn sender_labels_are_escaped_in_output() {
        let mut transcript = HtmlTranscript::new();
        let row = transcript.append_row(&SenderLabel::bot("<b>Bot</b>"));
        transcript.append_text(row, "hi");
        let html = transcript.to_html();
        assert!(html.contains("<strong>&lt;b&gt;Bot&lt;/b&gt;:</strong>"));
        assert!(html.contains("chat-row bot"));
        assert_eq!(transcript.row_text(row), Some("hi"));
    }
}
