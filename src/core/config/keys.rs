use std::path::PathBuf;

use crate::core::config::data::Config;
use crate::core::config::io::ConfigError;

/// Keys accepted by `set`/`unset`, in display order.
pub const CONFIG_KEYS: &[&str] = &[
    "bot-label",
    "user-label",
    "fallback-message",
    "interrupted-message",
    "log-dir",
    "log-paused",
    "reveal.tick-ms",
    "reveal.batch-size",
    "reveal.batch-delay-ms",
    "reveal.cancel-previous",
    "split.trigger",
    "split.cleanup",
];

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: "expected a non-negative integer".to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: "expected on/off".to_string(),
        }),
    }
}

impl Config {
    /// Set a single key. `split.trigger` and `split.cleanup` append to their
    /// lists (starting from the defaults) instead of replacing them.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "bot-label" => self.bot_label = Some(value.to_string()),
            "user-label" => self.user_label = Some(value.to_string()),
            "fallback-message" => self.fallback_message = Some(value.to_string()),
            "interrupted-message" => self.interrupted_message = Some(value.to_string()),
            "log-dir" => self.log_dir = Some(PathBuf::from(value)),
            "log-paused" => self.log_paused = Some(parse_bool(key, value)?),
            "reveal.tick-ms" => {
                let tick: u64 = parse_number(key, value)?;
                if tick == 0 {
                    return Err(ConfigError::InvalidValue {
                        key: key.to_string(),
                        value: value.to_string(),
                        reason: "the tick must be at least 1 ms".to_string(),
                    });
                }
                self.reveal.tick_ms = Some(tick);
            }
            "reveal.batch-size" => {
                let size: usize = parse_number(key, value)?;
                if size == 0 {
                    return Err(ConfigError::InvalidValue {
                        key: key.to_string(),
                        value: value.to_string(),
                        reason: "a batch holds at least one image".to_string(),
                    });
                }
                self.reveal.batch_size = Some(size);
            }
            "reveal.batch-delay-ms" => {
                self.reveal.batch_delay_ms = Some(parse_number(key, value)?)
            }
            "reveal.cancel-previous" => {
                self.reveal.cancel_previous = Some(parse_bool(key, value)?)
            }
            "split.trigger" => {
                regex::Regex::new(value).map_err(|source| ConfigError::InvalidTrigger {
                    pattern: value.to_string(),
                    source,
                })?;
                let mut triggers = self.split_config().triggers;
                triggers.push(value.to_string());
                self.split.triggers = Some(triggers);
            }
            "split.cleanup" => {
                let mut cleanup = self.split_config().cleanup;
                cleanup.push(value.to_string());
                self.split.cleanup = Some(cleanup);
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    /// Reset a key to its built-in default.
    pub fn unset_value(&mut self, key: &str) -> Result<(), ConfigError> {
        match key {
            "bot-label" => self.bot_label = None,
            "user-label" => self.user_label = None,
            "fallback-message" => self.fallback_message = None,
            "interrupted-message" => self.interrupted_message = None,
            "log-dir" => self.log_dir = None,
            "log-paused" => self.log_paused = None,
            "reveal.tick-ms" => self.reveal.tick_ms = None,
            "reveal.batch-size" => self.reveal.batch_size = None,
            "reveal.batch-delay-ms" => self.reveal.batch_delay_ms = None,
            "reveal.cancel-previous" => self.reveal.cancel_previous = None,
            "split.trigger" => self.split.triggers = None,
            "split.cleanup" => self.split.cleanup = None,
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }
}
