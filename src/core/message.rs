use serde::{Deserialize, Serialize};

use crate::core::markup::escape_html;
use crate::core::sink::{MessageSink, RowId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SenderRole {
    User,
    Bot,
}

impl SenderRole {
    pub fn as_str(self) -> &'static str {
        match self {
            SenderRole::User => "user",
            SenderRole::Bot => "bot",
        }
    }

    /// CSS class used for both the chat row and its bubble.
    pub fn css_class(self) -> &'static str {
        self.as_str()
    }
}

impl TryFrom<&str> for SenderRole {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "user" => Ok(SenderRole::User),
            "bot" => Ok(SenderRole::Bot),
            _ => Err(format!("invalid sender role: {value}")),
        }
    }
}

impl TryFrom<String> for SenderRole {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl From<SenderRole> for String {
    fn from(value: SenderRole) -> Self {
        value.as_str().to_string()
    }
}

/// Who a row belongs to and the name shown in front of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SenderLabel {
    pub role: SenderRole,
    pub display: String,
}

impl SenderLabel {
    pub fn new(role: SenderRole, display: impl Into<String>) -> Self {
        Self {
            role,
            display: display.into(),
        }
    }

    pub fn user(display: impl Into<String>) -> Self {
        Self::new(SenderRole::User, display)
    }

    pub fn bot(display: impl Into<String>) -> Self {
        Self::new(SenderRole::Bot, display)
    }
}

/// Write a user message in one go. The text is escaped; user input is never
/// interpreted as markup.
pub fn post_user_message<S: MessageSink + ?Sized>(
    sink: &mut S,
    label: &SenderLabel,
    text: &str,
) -> RowId {
    post_whole(sink, label, text)
}

/// Write a bot notice (errors, interruptions) without the typing effect.
pub fn post_notice<S: MessageSink + ?Sized>(
    sink: &mut S,
    label: &SenderLabel,
    text: &str,
) -> RowId {
    post_whole(sink, label, text)
}

fn post_whole<S: MessageSink + ?Sized>(sink: &mut S, label: &SenderLabel, text: &str) -> RowId {
    let row = sink.append_row(label);
    sink.append_text(row, &escape_html(text.trim()));
    sink.scroll_to_bottom();
    row
}

/// Text for a bot row reporting a backend error.
pub fn error_notice(message: &str) -> String {
    format!("⚠️ Error: {}", message.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sink::HtmlTranscript;

    #[test]
    fn roles_round_trip_through_strings() {
        for role in [SenderRole::User, SenderRole::Bot] {
            assert_eq!(SenderRole::try_from(role.as_str()), Ok(role));
        }
        assert!(SenderRole::try_from("assistant").is_err());
    }

    #[test]
    fn user_messages_are_escaped_and_complete() {
        let mut transcript = HtmlTranscript::new();
        let row = post_user_message(
            &mut transcript,
            &SenderLabel::user("Bạn"),
            "  <img src=x onerror=alert(1)> tranh sen  ",
        );
        assert_eq!(
            transcript.row_text(row),
            Some("&lt;img src=x onerror=alert(1)&gt; tranh sen")
        );
        assert_eq!(transcript.scroll_count(), 1);
    }

    #[test]
    fn notices_are_bot_rows() {
        let mut transcript = HtmlTranscript::new();
        let row = post_notice(&mut transcript, &SenderLabel::bot("Bot"), &error_notice("a & b"));
        assert_eq!(transcript.row_text(row), Some("⚠️ Error: a &amp; b"));
        assert!(transcript.to_html().contains("chat-row bot"));
    }

    #[test]
    fn error_notice_is_prefixed() {
        assert_eq!(error_notice(" quota exceeded\n"), "⚠️ Error: quota exceeded");
    }
}
