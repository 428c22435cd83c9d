use std::time::Duration;

use crate::core::config::data::Config;
use crate::core::reveal::RevealConfig;
use crate::core::split::SplitConfig;

pub const DEFAULT_BOT_LABEL: &str = "Bot";
pub const DEFAULT_USER_LABEL: &str = "You";
pub const DEFAULT_FALLBACK_MESSAGE: &str =
    "Sorry, something went wrong while contacting the assistant. Please try again later.";
pub const DEFAULT_INTERRUPTED_MESSAGE: &str = "Connection interrupted. Please try again later.";

pub const DEFAULT_TICK_MS: u64 = 9;
pub const DEFAULT_BATCH_SIZE: usize = 4;
pub const DEFAULT_BATCH_DELAY_MS: u64 = 150;

/// Trigger patterns that start the markup part of a reply: an HTML tag,
/// an image directive, a link directive, a bare URL, a leading list number.
pub const DEFAULT_TRIGGERS: &[&str] = &[
    r"(?i)<(?:div|img|a|p|span|ul|ol|li|table|h[1-6]|br)\b",
    r"!\[",
    r"\[[^\]\n]*\]\(",
    r"(?i)https?://",
    r"(?m)^[ \t]*\d+[.)][ \t]",
];

pub const DEFAULT_CLEANUP: &[&str] = &["```html", "```"];

impl Config {
    pub fn bot_label(&self) -> &str {
        self.bot_label.as_deref().unwrap_or(DEFAULT_BOT_LABEL)
    }

    pub fn user_label(&self) -> &str {
        self.user_label.as_deref().unwrap_or(DEFAULT_USER_LABEL)
    }

    pub fn fallback_message(&self) -> &str {
        self.fallback_message
            .as_deref()
            .unwrap_or(DEFAULT_FALLBACK_MESSAGE)
    }

    pub fn interrupted_message(&self) -> &str {
        self.interrupted_message
            .as_deref()
            .unwrap_or(DEFAULT_INTERRUPTED_MESSAGE)
    }

    pub fn log_paused(&self) -> bool {
        self.log_paused.unwrap_or(false)
    }

    pub fn reveal_config(&self) -> RevealConfig {
        let reveal = &self.reveal;
        RevealConfig {
            tick: Duration::from_millis(reveal.tick_ms.unwrap_or(DEFAULT_TICK_MS).max(1)),
            batch_size: reveal.batch_size.unwrap_or(DEFAULT_BATCH_SIZE).max(1),
            batch_delay: Duration::from_millis(
                reveal.batch_delay_ms.unwrap_or(DEFAULT_BATCH_DELAY_MS),
            ),
            cancel_previous: reveal.cancel_previous.unwrap_or(false),
        }
    }

    pub fn split_config(&self) -> SplitConfig {
        let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        SplitConfig {
            triggers: self
                .split
                .triggers
                .clone()
                .unwrap_or_else(|| owned(DEFAULT_TRIGGERS)),
            cleanup: self
                .split
                .cleanup
                .clone()
                .unwrap_or_else(|| owned(DEFAULT_CLEANUP)),
        }
    }
}
