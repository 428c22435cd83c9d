use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Timing for the typed reveal and the gallery stagger.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct RevealSettings {
    /// Milliseconds between two revealed characters
    pub tick_ms: Option<u64>,
    /// Images inserted per gallery batch
    pub batch_size: Option<usize>,
    /// Pause after a batch has settled, in milliseconds
    pub batch_delay_ms: Option<u64>,
    /// Cancel the running reveal when a new reply arrives
    pub cancel_previous: Option<bool>,
}

/// Where a reply stops being prose, and what gets stripped before splitting.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct SplitSettings {
    /// Regular expressions; the earliest match starts the markup part
    pub triggers: Option<Vec<String>>,
    /// Literal strings removed from the reply before splitting
    pub cleanup: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Label shown in front of bot replies
    pub bot_label: Option<String>,
    /// Label shown in front of user messages
    pub user_label: Option<String>,
    /// Reply rendered when the backend request fails
    pub fallback_message: Option<String>,
    /// Row appended when an event stream ends without its terminator
    pub interrupted_message: Option<String>,
    /// Directory for daily transcript logs; logging is off when unset
    pub log_dir: Option<PathBuf>,
    /// Keep `log_dir` but stop writing to it
    pub log_paused: Option<bool>,
    #[serde(default)]
    pub reveal: RevealSettings,
    #[serde(default)]
    pub split: SplitSettings,
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
///
/// # Examples
/// - Unix: `/home/user/.config/causette/config.toml` → `~/.config/causette/config.toml`
/// - macOS: `/Users/user/Library/Application Support/...` → `~/Library/Application Support/...`
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
