//! Domain models for the dose journal.

mod dose;
mod duration;
mod journal;
mod substance;

pub use dose::*;
pub use duration::*;
pub use journal::*;
pub use substance::*;
