//! Causette renders chatbot replies incrementally.
//!
//! A reply is split into a prose part and a markup part:
//! - [`core::split`] strips formatting artifacts and finds the boundary.
//! - [`core::reveal`] types the prose one grapheme per tick, then inserts the
//!   card built by [`core::markup`] and fills its gallery in batches.
//! - [`core::stream`] renders replies that arrive as server-sent events.
//! - [`core::sink`] is the display surface both write into;
//!   [`core::sink::HtmlTranscript`] keeps it in memory.
//! - [`api`] defines the request and reply payloads exchanged with the chat
//!   backend.
//!
//! The binary (`src/main.rs`) routes through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod core;
pub mod utils;
