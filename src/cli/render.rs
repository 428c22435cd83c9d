//! Non-interactive `render` and `stream` commands

use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tracing::{debug, warn};

use crate::api::ChatReply;
use crate::core::config::{path_display, Config, ConfigError};
use crate::core::message::{post_user_message, SenderLabel};
use crate::core::reveal::{RevealOutcome, RevealScheduler};
use crate::core::sink::{lock_sink, shared, HtmlTranscript, SharedSink};
use crate::core::split::ReplySplitter;
use crate::core::stream::{sse_events, StreamRenderer, StreamSummary};
use crate::utils::logging::TranscriptLog;

#[derive(Debug, Default, Clone)]
pub struct RenderOptions {
    pub input: Option<PathBuf>,
    pub json: bool,
    pub sender: Option<String>,
    pub user: Option<String>,
    pub output: Option<PathBuf>,
    pub tick_ms: Option<u64>,
}

#[derive(Debug, Default, Clone)]
pub struct StreamOptions {
    pub input: Option<PathBuf>,
    pub user: Option<String>,
    pub output: Option<PathBuf>,
}

pub async fn run_render(options: RenderOptions) -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    let raw = read_input(options.input.as_deref()).await?;
    let reply = if options.json {
        reply_from_json(&raw, config.fallback_message())
    } else {
        raw
    };

    let sink = shared(HtmlTranscript::new());
    let outcome = render_reply(&config, &reply, &options, &sink).await?;
    debug!(phase = ?outcome.phase, units = outcome.revealed_units, "render finished");

    let html = lock_sink(&sink).to_html();
    write_output(options.output.as_deref(), &html).await?;
    log_exchange(&config, options.user.as_deref(), &reply);
    Ok(())
}

pub async fn run_stream(options: StreamOptions) -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    let reader: Box<dyn AsyncRead + Unpin + Send> = match options.input.as_deref() {
        Some(path) => match tokio::fs::File::open(path).await {
            Ok(file) => Box::new(file),
            Err(err) => {
                return Err(format!("Failed to open {}: {err}", path_display(path)).into())
            }
        },
        None => Box::new(tokio::io::stdin()),
    };

    let sink = shared(HtmlTranscript::new());
    let summary = render_stream(&config, reader, options.user.as_deref(), &sink).await;
    if let Some(error) = &summary.error {
        eprintln!("⚠️ Stream reported an error: {error}");
    } else if !summary.completed {
        eprintln!("⚠️ Stream ended before [DONE]");
    }

    let html = lock_sink(&sink).to_html();
    write_output(options.output.as_deref(), &html).await
}

/// Reveal `reply` (after an optional user row) into `sink`.
pub async fn render_reply(
    config: &Config,
    reply: &str,
    options: &RenderOptions,
    sink: &SharedSink<HtmlTranscript>,
) -> Result<RevealOutcome, ConfigError> {
    let mut reveal = config.reveal_config();
    if let Some(tick_ms) = options.tick_ms {
        reveal.tick = Duration::from_millis(tick_ms.max(1));
    }
    let scheduler = RevealScheduler::new(reveal, ReplySplitter::new(&config.split_config())?);

    if let Some(user) = options.user.as_deref() {
        post_user_message(
            &mut *lock_sink(sink),
            &SenderLabel::user(config.user_label()),
            user,
        );
    }
    let sender = options.sender.as_deref().unwrap_or(config.bot_label());
    Ok(scheduler
        .run(SenderLabel::bot(sender), reply, sink.clone())
        .await)
}

/// Render an event stream (after an optional user row) into `sink`. A stream
/// that reached `[DONE]` is written to the transcript log.
pub async fn render_stream<R>(
    config: &Config,
    reader: R,
    user: Option<&str>,
    sink: &SharedSink<HtmlTranscript>,
) -> StreamSummary
where
    R: AsyncRead + Unpin,
{
    if let Some(user) = user {
        post_user_message(
            &mut *lock_sink(sink),
            &SenderLabel::user(config.user_label()),
            user,
        );
    }
    let summary = StreamRenderer::from_config(config)
        .render(sse_events(reader), sink)
        .await;
    if summary.completed {
        log_exchange(config, user, &summary.reply);
    }
    summary
}

/// Pull the reply out of a one-shot JSON body, falling back to the configured
/// apology when it is missing or unreadable.
pub fn reply_from_json(raw: &str, fallback: &str) -> String {
    match serde_json::from_str::<ChatReply>(raw) {
        Ok(reply) => reply.text_or(fallback).to_string(),
        Err(err) => {
            warn!(error = %err, "unreadable reply body");
            fallback.to_string()
        }
    }
}

async fn read_input(path: Option<&Path>) -> Result<String, Box<dyn Error>> {
    match path {
        Some(path) => match tokio::fs::read_to_string(path).await {
            Ok(text) => Ok(text),
            Err(err) => Err(format!("Failed to read {}: {err}", path_display(path)).into()),
        },
        None => {
            let mut text = String::new();
            tokio::io::stdin().read_to_string(&mut text).await?;
            Ok(text)
        }
    }
}

async fn write_output(path: Option<&Path>, html: &str) -> Result<(), Box<dyn Error>> {
    match path {
        Some(path) => {
            tokio::fs::write(path, html).await?;
            eprintln!("✅ Wrote {}", path_display(path));
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(html.as_bytes()).await?;
            stdout.flush().await?;
        }
    }
    Ok(())
}

fn log_exchange(config: &Config, user: Option<&str>, reply: &str) {
    let Some(user) = user else {
        return;
    };
    let log = TranscriptLog::from_config(config);
    if let Err(err) = log.log_exchange(user, reply) {
        warn!(error = %err, "failed to write transcript log");
    }
}
