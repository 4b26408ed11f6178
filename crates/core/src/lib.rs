//! Domain types for car scan reconstruction jobs.
//!
//! Pure data and validation only: no I/O, no async, no internal
//! dependencies. Storage and processing crates build on these types.

pub mod error;
pub mod job;
pub mod naming;
pub mod types;
