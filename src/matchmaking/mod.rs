pub mod queue;

pub use queue::{EnqueueOutcome, MatchQueue, QueueEntry};
