//! Inline markup parser for the rich tail of a bot reply.
//!
//! The dialect is deliberately small: `![alt](url)` images, `[label](url)`
//! links and bare `http(s)://` URLs. Replies that already carry HTML tags are
//! passed through with only their bare URLs linkified. Everything else is
//! escaped before it reaches the output.

mod html;
mod render;
mod tokenizer;


pub use html::{escape_attr, escape_html, is_safe_url, linkify_html, looks_like_html};
pub use render::{
    parse, parse_fragment, Anchor, ImageBlock, RenderFragment, TitleBlock, CARD_CLASS,
    GALLERY_CLASS,
};
pub use tokenizer::{tokenize, Token, TokenKind};
