//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod render;

#[cfg(test)]
mod tests;

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::cli::render::{run_render, run_stream, RenderOptions, StreamOptions};
use crate::core::config::{path_display, Config};

/// Environment variable holding the `tracing` filter directives.
pub const LOG_ENV: &str = "CAUSETTE_LOG";

#[derive(Parser)]
#[command(name = "causette")]
#[command(version)]
#[command(about = "Render chat replies with a typing reveal and product cards")]
#[command(
    long_about = "Causette renders chatbot replies the way the chat widget shows them: the \
prose part is revealed one character at a time, and the trailing markup (images, links, \
product titles or raw HTML) is turned into a product card whose gallery is filled in \
batches.\n\n\
The rendered chat panel is written as HTML to stdout or to --output.\n\n\
Environment Variables:\n\
  CAUSETTE_LOG      tracing filter for diagnostics on stderr (default: warn)"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Reveal a complete reply and write the chat panel
    Render {
        /// File holding the reply (stdin when omitted)
        file: Option<PathBuf>,
        /// Treat the input as a one-shot `{"response": ...}` reply
        #[arg(long)]
        json: bool,
        /// Name shown in front of the bot row
        #[arg(long, value_name = "NAME")]
        sender: Option<String>,
        /// User message to show before the reply
        #[arg(long, value_name = "MESSAGE")]
        user: Option<String>,
        /// Write the panel HTML here instead of stdout
        #[arg(short = 'o', long, value_name = "FILE")]
        output: Option<PathBuf>,
        /// Override the reveal tick interval
        #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..))]
        tick_ms: Option<u64>,
    },
    /// Render a server-sent event stream of tokens and html payloads
    Stream {
        /// File holding the event stream (stdin when omitted)
        file: Option<PathBuf>,
        /// User message to show before the reply
        #[arg(long, value_name = "MESSAGE")]
        user: Option<String>,
        /// Write the panel HTML here instead of stdout
        #[arg(short = 'o', long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Set configuration values
    Set {
        /// Configuration key to set
        key: String,
        /// Value to set for the key (can be multiple words)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Unset configuration values
    Unset {
        /// Configuration key to unset
        key: String,
    },
    /// Show the current configuration
    Config,
    /// Show build information
    Version,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let args = Args::parse();
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async_main(args))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    // A second init (tests, embedding) keeps the existing subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn async_main(args: Args) -> Result<(), Box<dyn Error>> {
    match args.command {
        Commands::Render {
            file,
            json,
            sender,
            user,
            output,
            tick_ms,
        } => {
            run_render(RenderOptions {
                input: file,
                json,
                sender,
                user,
                output,
                tick_ms,
            })
            .await
        }
        Commands::Stream { file, user, output } => {
            run_stream(StreamOptions {
                input: file,
                user,
                output,
            })
            .await
        }
        Commands::Set { key, value } => {
            let mut config = Config::load()?;
            if value.is_empty() {
                config.print_all();
                return Ok(());
            }
            let value = value.join(" ");
            config.set_value(&key, &value)?;
            config.save()?;
            println!("✅ Set {key} to: {value}");
            Ok(())
        }
        Commands::Unset { key } => {
            let mut config = Config::load()?;
            config.unset_value(&key)?;
            config.save()?;
            println!("✅ Unset {key}");
            Ok(())
        }
        Commands::Config => {
            let config = Config::load()?;
            println!("Config file: {}", path_display(Config::get_config_path()?));
            config.print_all();
            Ok(())
        }
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

fn print_version() {
    let unknown = "unknown";
    println!("causette {}", env!("CARGO_PKG_VERSION"));
    println!(
        "  commit: {} ({})",
        option_env!("VERGEN_GIT_DESCRIBE").unwrap_or(unknown),
        option_env!("VERGEN_GIT_BRANCH").unwrap_or(unknown)
    );
    println!(
        "  built: {}",
        option_env!("VERGEN_BUILD_TIMESTAMP").unwrap_or(unknown)
    );
    println!(
        "  rustc: {} ({})",
        option_env!("VERGEN_RUSTC_SEMVER").unwrap_or(unknown),
        option_env!("VERGEN_CARGO_TARGET_TRIPLE").unwrap_or(unknown)
    );
}
