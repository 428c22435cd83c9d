use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use chrono::{Local, NaiveDate, NaiveDateTime};

use crate::core::config::{path_display, Config};

/// Daily transcript files: one `<YYYY-MM-DD>.txt` per day under the log
/// directory, each exchange stamped with the local time.
pub struct TranscriptLog {
    dir: Option<PathBuf>,
    is_active: bool,
}

impl TranscriptLog {
    pub fn new(dir: Option<PathBuf>) -> Self {
        let is_active = dir.is_some();
        TranscriptLog { dir, is_active }
    }

    /// Log to `log_dir`, unless `log_paused` is on.
    pub fn from_config(config: &Config) -> Self {
        let mut log = Self::new(config.log_dir.clone());
        if config.log_paused() {
            log.pause();
        }
        log
    }

    pub fn pause(&mut self) {
        self.is_active = false;
    }

    pub fn file_for(&self, date: NaiveDate) -> Option<PathBuf> {
        self.dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.txt", date.format("%Y-%m-%d"))))
    }

    pub fn log_exchange(&self, user: &str, reply: &str) -> Result<(), Box<dyn std::error::Error>> {
        self.log_exchange_at(Local::now().naive_local(), user, reply)
    }

    pub fn log_exchange_at(
        &self,
        at: NaiveDateTime,
        user: &str,
        reply: &str,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if !self.is_active {
            return Ok(());
        }
        let Some(path) = self.file_for(at.date()) else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "[{}] user: {}", at.format("%H:%M:%S"), user.trim())?;
        writeln!(writer, "bot: {}", reply.trim())?;
        writeln!(writer, "---")?;
        writer.flush()?;
        Ok(())
    }

    pub fn get_status_string(&self) -> String {
        match (&self.dir, self.is_active) {
            (None, _) => "disabled".to_string(),
            (Some(dir), true) => format!("active ({})", path_display(dir)),
            (Some(dir), false) => format!("paused ({})", path_display(dir)),
        }
    }
}
