//! Pre-cleaning and prose/markup boundary detection.

use regex::Regex;

use crate::core::config::defaults::{DEFAULT_CLEANUP, DEFAULT_TRIGGERS};
use crate::core::config::ConfigError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitConfig {
    pub triggers: Vec<String>,
    pub cleanup: Vec<String>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            triggers: DEFAULT_TRIGGERS.iter().map(|s| s.to_string()).collect(),
            cleanup: DEFAULT_CLEANUP.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// A reply cut in two: `prose + markup` is the cleaned reply.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SplitReply {
    pub prose: String,
    pub markup: String,
}

impl SplitReply {
    pub fn has_markup(&self) -> bool {
        !self.markup.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct ReplySplitter {
    triggers: Vec<Regex>,
    cleanup: Vec<String>,
}

impl Default for ReplySplitter {
    fn default() -> Self {
        // The built-in patterns are covered by tests; an empty trigger set is
        // the only sane fallback if that ever stops holding.
        Self::new(&SplitConfig::default()).unwrap_or_else(|_| Self {
            triggers: Vec::new(),
            cleanup: DEFAULT_CLEANUP.iter().map(|s| s.to_string()).collect(),
        })
    }
}

impl ReplySplitter {
    pub fn new(config: &SplitConfig) -> Result<Self, ConfigError> {
        let triggers = config
            .triggers
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| ConfigError::InvalidTrigger {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            triggers,
            cleanup: config
                .cleanup
                .iter()
                .filter(|literal| !literal.is_empty())
                .cloned()
                .collect(),
        })
    }

    /// Remove the configured formatting artifacts, in order, then trim.
    pub fn clean(&self, text: &str) -> String {
        let mut cleaned = text.to_string();
        for literal in &self.cleanup {
            if cleaned.contains(literal.as_str()) {
                cleaned = cleaned.replace(literal.as_str(), "");
            }
        }
        cleaned.trim().to_string()
    }

    /// Byte offset of the earliest trigger match in `text`.
    pub fn boundary(&self, text: &str) -> Option<usize> {
        self.triggers
            .iter()
            .filter_map(|trigger| trigger.find(text).map(|m| m.start()))
            .min()
    }

    pub fn split(&self, text: &str) -> SplitReply {
        let cleaned = self.clean(text);
        match self.boundary(&cleaned) {
            Some(at) => {
                let markup = cleaned[at..].to_string();
                let mut prose = cleaned;
                prose.truncate(at);
                SplitReply { prose, markup }
            }
            None => SplitReply {
                prose: cleaned,
                markup: String::new(),
            },
        }
    }
}
