//! Bar sources that live inside the engine crate.
//!
//! Market data fetching is the caller's job; the only generator here is a
//! seeded synthetic series for demos, tests and benchmarks.

pub mod synthetic;

pub use synthetic::random_walk;
