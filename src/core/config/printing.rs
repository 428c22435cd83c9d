use crate::core::config::data::{path_display, Config};
use crate::utils::logging::TranscriptLog;

impl Config {
    pub fn print_all(&self) {
        println!("Current configuration:");
        println!("  bot-label: {}", self.bot_label());
        println!("  user-label: {}", self.user_label());
        println!("  fallback-message: {}", self.fallback_message());
        println!("  interrupted-message: {}", self.interrupted_message());
        match &self.log_dir {
            Some(dir) => println!("  log-dir: {}", path_display(dir)),
            None => println!("  log-dir: (unset)"),
        }
        println!(
            "  log-paused: {}",
            if self.log_paused() { "on" } else { "off" }
        );
        println!(
            "  transcript log: {}",
            TranscriptLog::from_config(self).get_status_string()
        );

        let reveal = self.reveal_config();
        println!("  reveal.tick-ms: {}", reveal.tick.as_millis());
        println!("  reveal.batch-size: {}", reveal.batch_size);
        println!("  reveal.batch-delay-ms: {}", reveal.batch_delay.as_millis());
        match reveal.cancel_previous {
            true => println!("  reveal.cancel-previous: on"),
            false => println!("  reveal.cancel-previous: off"),
        }

        let split = self.split_config();
        println!("  split.triggers:");
        for trigger in &split.triggers {
            println!("    {trigger}");
        }
        println!("  split.cleanup:");
        for literal in &split.cleanup {
            println!("    {literal:?}");
        }
    }
}
