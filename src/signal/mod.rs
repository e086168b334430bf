//! Fine-grained reactive primitives.
//!
//! - Signals: Reactive state containers
//! - Effects: Side effects that react to changes

mod effect;
mod signal;

pub use effect::{create_effect, Effect};
pub use signal::{Signal, WatchGuard};
