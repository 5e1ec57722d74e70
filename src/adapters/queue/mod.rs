//! Queue adapters.

mod bounded;

pub use bounded::BoundedQueue;
