//! Incremental reveal of a bot reply.
//!
//! A reveal walks through `Typing -> MarkupPending -> BatchLoading -> Done`:
//! the prose part is appended one grapheme per timer tick, then the markup
//! part is parsed and inserted after the message row, with image galleries
//! added in fixed-size batches. [`RevealMachine`] holds the synchronous state
//! transitions; [`RevealScheduler`] drives them on tokio timers and stops
//! when its cancellation token fires or the row leaves the panel.

mod machine;
mod scheduler;


pub use machine::{gallery_batches, RevealMachine, RevealOutcome, RevealPhase, TickOutcome};
pub use scheduler::{RevealConfig, RevealHandle, RevealScheduler};
