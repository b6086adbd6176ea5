//! Shared test doubles for the Talent Radar runtime and domains.

mod clock;
mod context;
mod repository;
mod rng;

pub use clock::FixedClock;
pub use context::{context_with, in_memory_context};
pub use repository::{FailingRepository, InMemoryRepository};
pub use rng::{MockRng, SequenceRng};
