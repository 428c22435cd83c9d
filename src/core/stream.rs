//! Rendering replies that arrive as server-sent events.
//!
//! The streaming backend sends `data:` frames carrying `token`, `html` or
//! `error` fields and closes with `data: [DONE]`. Tokens land in the bot row
//! as they arrive; html payloads go through the markup parser and are appended
//! to the panel.

use std::collections::VecDeque;

use futures_util::stream::{self, Stream, StreamExt};
use memchr::memchr;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, warn};

use crate::api::StreamPayload;
use crate::core::config::Config;
use crate::core::markup::{escape_html, parse_fragment};
use crate::core::message::{error_notice, post_notice, SenderLabel};
use crate::core::sink::{lock_sink, MessageSink, SharedSink};

const READ_CHUNK: usize = 4096;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplyEvent {
    Token(String),
    Html(String),
    Error(String),
    Done,
}

fn extract_data_payload(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim_start)
}

/// Decode a single SSE line. Comments, blank lines and other fields yield
/// nothing.
pub fn decode_line(line: &str) -> Vec<ReplyEvent> {
    extract_data_payload(line.trim_end_matches('\r'))
        .map(decode_payload)
        .unwrap_or_default()
}

/// Decode the payload of a `data:` field.
pub fn decode_payload(payload: &str) -> Vec<ReplyEvent> {
    let payload = payload.trim();
    if payload.is_empty() {
        return Vec::new();
    }
    if payload == "[DONE]" {
        return vec![ReplyEvent::Done];
    }

    match serde_json::from_str::<StreamPayload>(payload) {
        Ok(frame) => {
            let mut events = Vec::new();
            if let Some(token) = frame.token.as_ref().filter(|t| !t.is_empty()) {
                events.push(ReplyEvent::Token(token.clone()));
            }
            if let Some(html) = frame.html.as_ref().filter(|h| !h.trim().is_empty()) {
                events.push(ReplyEvent::Html(html.clone()));
            }
            if let Some(error) = frame.error_summary() {
                events.push(ReplyEvent::Error(error));
            }
            events
        }
        Err(err) => {
            debug!(error = %err, "unparseable stream payload");
            vec![ReplyEvent::Error(payload.to_string())]
        }
    }
}

/// Turns arbitrary byte chunks into complete SSE lines.
#[derive(Debug, Default)]
pub struct SseLineBuffer {
    buffer: Vec<u8>,
}

impl SseLineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<ReplyEvent> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some(newline_pos) = memchr(b'\n', &self.buffer) {
            match std::str::from_utf8(&self.buffer[..newline_pos]) {
                Ok(line) => events.extend(decode_line(line.trim())),
                Err(err) => warn!(error = %err, "skipping invalid UTF-8 in stream"),
            }
            self.buffer.drain(..=newline_pos);
        }
        events
    }

    /// Decode whatever is left after the final chunk.
    pub fn finish(&mut self) -> Vec<ReplyEvent> {
        let rest = std::mem::take(&mut self.buffer);
        match std::str::from_utf8(&rest) {
            Ok(line) => decode_line(line.trim()),
            Err(err) => {
                warn!(error = %err, "skipping invalid UTF-8 at end of stream");
                Vec::new()
            }
        }
    }

    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

struct ReadState<R> {
    reader: R,
    lines: SseLineBuffer,
    ready: VecDeque<ReplyEvent>,
    eof: bool,
}

/// Stream of events read incrementally from `reader`. A read error ends the
/// stream as if the connection dropped.
pub fn sse_events<R>(reader: R) -> impl Stream<Item = ReplyEvent>
where
    R: AsyncRead + Unpin,
{
    let state = ReadState {
        reader,
        lines: SseLineBuffer::new(),
        ready: VecDeque::new(),
        eof: false,
    };
    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(event) = state.ready.pop_front() {
                return Some((event, state));
            }
            if state.eof {
                return None;
            }
            let mut chunk = [0u8; READ_CHUNK];
            match state.reader.read(&mut chunk).await {
                Ok(0) => {
                    state.eof = true;
                    let rest = state.lines.finish();
                    state.ready.extend(rest);
                }
                Ok(n) => {
                    let events = state.lines.push(&chunk[..n]);
                    state.ready.extend(events);
                }
                Err(err) => {
                    warn!(error = %err, "stream read failed");
                    state.eof = true;
                }
            }
        }
    })
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StreamSummary {
    pub tokens: usize,
    pub fragments: usize,
    /// Whether the stream closed with `[DONE]`.
    pub completed: bool,
    pub error: Option<String>,
    /// Raw token text, in arrival order.
    pub reply: String,
}

pub struct StreamRenderer {
    sender: SenderLabel,
    interrupted_message: String,
}

impl StreamRenderer {
    pub fn new(sender: SenderLabel, interrupted_message: impl Into<String>) -> Self {
        Self {
            sender,
            interrupted_message: interrupted_message.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            SenderLabel::bot(config.bot_label()),
            config.interrupted_message(),
        )
    }

    pub async fn render<E, S>(&self, events: E, sink: &SharedSink<S>) -> StreamSummary
    where
        E: Stream<Item = ReplyEvent>,
        S: MessageSink,
    {
        let mut events = std::pin::pin!(events);
        let row = {
            let mut guard = lock_sink(sink);
            let row = guard.append_row(&self.sender);
            guard.scroll_to_bottom();
            row
        };
        let mut summary = StreamSummary::default();

        while let Some(event) = events.next().await {
            let mut guard = lock_sink(sink);
            match event {
                ReplyEvent::Token(token) => {
                    guard.append_text(row, &escape_html(&token));
                    guard.scroll_to_bottom();
                    summary.tokens += 1;
                    summary.reply.push_str(&token);
                }
                ReplyEvent::Html(html) => match parse_fragment(&html) {
                    Some(fragment) => {
                        guard.append_fragment(&fragment.to_html());
                        guard.scroll_to_bottom();
                        summary.fragments += 1;
                    }
                    None => debug!("html payload rendered empty"),
                },
                ReplyEvent::Error(message) => {
                    warn!(error = %message, "stream reported an error");
                    post_notice(&mut *guard, &self.sender, &error_notice(&message));
                    summary.error = Some(message);
                    return summary;
                }
                ReplyEvent::Done => {
                    summary.completed = true;
                    debug!(
                        tokens = summary.tokens,
                        fragments = summary.fragments,
                        "stream done"
                    );
                    return summary;
                }
            }
        }

        debug!(tokens = summary.tokens, "stream ended without [DONE]");
        post_notice(
            &mut *lock_sink(sink),
            &self.sender,
            &self.interrupted_message,
        );
        summary
    }
}
