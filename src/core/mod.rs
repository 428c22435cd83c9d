pub mod config;
pub mod markup;
pub mod message;
pub mod reveal;
pub mod sink;
pub mod split;
pub mod stream;
