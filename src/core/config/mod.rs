pub mod data;
pub mod defaults;
pub mod io;
pub mod keys;
pub mod printing;

#[cfg(test)]
pub mod tests;

pub use data::{path_display, Config, RevealSettings, SplitSettings};
pub use io::ConfigError;
