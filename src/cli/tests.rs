use super::render::{render_reply, render_stream, reply_from_json, RenderOptions};
use super::*;
use crate::core::reveal::RevealPhase;
use crate::core::sink::{lock_sink, shared, HtmlTranscript};
use std::fs;
use tempfile::TempDir;

fn parse_args(argv: &[&str]) -> Args {
    Args::try_parse_from(argv)
        .unwrap_or_else(|err| panic!("argv={argv:?} should parse successfully: {err}"))
}

#[test]
fn render_accepts_all_flags() {
    let argv = [
        "causette", "render", "reply.txt", "--json", "--sender", "CGI", "--user", "tranh sen",
        "-o", "out.html", "--tick-ms", "5",
    ];
    match parse_args(&argv).command {
        Commands::Render {
            file,
            json,
            sender,
            user,
            output,
            tick_ms,
        } => {
            assert_eq!(file, Some(PathBuf::from("reply.txt")));
            assert!(json);
            assert_eq!(sender.as_deref(), Some("CGI"));
            assert_eq!(user.as_deref(), Some("tranh sen"));
            assert_eq!(output, Some(PathBuf::from("out.html")));
            assert_eq!(tick_ms, Some(5));
        }
        _ => panic!("expected render subcommand for argv={argv:?}"),
    }
}

#[test]
fn render_reads_stdin_by_default() {
    match parse_args(&["causette", "render"]).command {
        Commands::Render { file, json, .. } => {
            assert_eq!(file, None);
            assert!(!json);
        }
        _ => panic!("expected render subcommand"),
    }
}

#[test]
fn zero_tick_is_rejected() {
    assert!(Args::try_parse_from(["causette", "render", "--tick-ms", "0"]).is_err());
}

#[test]
fn set_joins_multi_word_values() {
    let argv = ["causette", "set", "fallback-message", "Xin", "lỗi", "nhé"];
    match parse_args(&argv).command {
        Commands::Set { key, value } => {
            assert_eq!(key, "fallback-message");
            assert_eq!(value.join(" "), "Xin lỗi nhé");
        }
        _ => panic!("expected set subcommand for argv={argv:?}"),
    }
}

#[test]
fn simple_subcommands_parse() {
    assert!(matches!(
        parse_args(&["causette", "unset", "log-dir"]).command,
        Commands::Unset { key } if key == "log-dir"
    ));
    assert!(matches!(
        parse_args(&["causette", "config"]).command,
        Commands::Config
    ));
    assert!(matches!(
        parse_args(&["causette", "version"]).command,
        Commands::Version
    ));
    assert!(matches!(
        parse_args(&["causette", "stream", "-o", "x.html"]).command,
        Commands::Stream { file: None, .. }
    ));
}

#[test]
fn json_replies_fall_back_to_apology() {
    assert_eq!(reply_from_json(r#"{"response":"Chào"}"#, "sorry"), "Chào");
    assert_eq!(reply_from_json(r#"{"response":""}"#, "sorry"), "sorry");
    assert_eq!(reply_from_json("<html>502</html>", "sorry"), "sorry");
}

#[tokio::test(start_paused = true)]
async fn render_reply_shows_user_row_then_bot_reveal() {
    let config = Config::default();
    let sink = shared(HtmlTranscript::new());
    let options = RenderOptions {
        sender: Some("CGI".into()),
        user: Some("<b>tranh</b>".into()),
        tick_ms: Some(1),
        ..Default::default()
    };

    let outcome = render_reply(&config, "Mời xem: ![Sen](http://x/1.png)", &options, &sink)
        .await
        .expect("default triggers compile");
    assert_eq!(outcome.phase, RevealPhase::Done);
    assert_eq!(outcome.batches_inserted, 1);

    let html = lock_sink(&sink).to_html();
    assert!(html.contains(
        "<strong>You:</strong> <span class=\"typing-text\">&lt;b&gt;tranh&lt;/b&gt;</span>"
    ));
    assert!(html.contains(
        "<strong>CGI:</strong> <span class=\"typing-text\">Mời xem: </span>"
    ));
    assert!(html.contains("src=\"http://x/1.png\""));
}

#[tokio::test]
async fn render_stream_reads_events_into_the_panel() {
    let config = Config::default();
    let sink = shared(HtmlTranscript::new());
    let body = "data: {\"token\":\"Xin \"}\n\ndata: {\"token\":\"chào\"}\n\ndata: [DONE]\n\n"
        .as_bytes();

    let summary = render_stream(&config, body, Some("hi"), &sink).await;
    assert!(summary.completed);
    assert_eq!(summary.tokens, 2);

    let transcript = lock_sink(&sink);
    let texts: Vec<&str> = transcript.rows().map(|r| r.text.as_str()).collect();
    assert_eq!(texts, vec!["hi", "Xin chào"]);
}

#[tokio::test]
async fn completed_stream_is_written_to_the_transcript_log() {
    let dir = TempDir::new().expect("tempdir");
    let config = Config {
        log_dir: Some(dir.path().join("logs")),
        ..Default::default()
    };
    let sink = shared(HtmlTranscript::new());
    let body = "data: {\"token\":\"Có \"}\n\ndata: {\"token\":\"ạ\"}\n\ndata: [DONE]\n"
        .as_bytes();

    let summary = render_stream(&config, body, Some("tranh sen?"), &sink).await;
    assert_eq!(summary.reply, "Có ạ");

    let files: Vec<_> = fs::read_dir(dir.path().join("logs"))
        .expect("log dir created")
        .map(|entry| entry.expect("entry").path())
        .collect();
    assert_eq!(files.len(), 1);
    let contents = fs::read_to_string(&files[0]).expect("read log");
    assert!(contents.ends_with("] user: tranh sen?\nbot: Có ạ\n---\n"), "{contents}");
}

#[tokio::test]
async fn interrupted_stream_is_not_logged() {
    let dir = TempDir::new().expect("tempdir");
    let config = Config {
        log_dir: Some(dir.path().join("logs")),
        ..Default::default()
    };
    let sink = shared(HtmlTranscript::new());
    let body = "data: {\"token\":\"Có\"}\n".as_bytes();

    let summary = render_stream(&config, body, Some("tranh sen?"), &sink).await;
    assert!(!summary.completed);
    assert!(!dir.path().join("logs").exists());
}

#[tokio::test]
async fn paused_log_skips_completed_streams() {
    let dir = TempDir::new().expect("tempdir");
    let config = Config {
        log_dir: Some(dir.path().join("logs")),
        log_paused: Some(true),
        ..Default::default()
    };
    let sink = shared(HtmlTranscript::new());
    let body = "data: {\"token\":\"Có\"}\n\ndata: [DONE]\n".as_bytes();

    let summary = render_stream(&config, body, Some("tranh sen?"), &sink).await;
    assert!(summary.completed);
    assert!(!dir.path().join("logs").exists());
}
