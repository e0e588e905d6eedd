//! In-process storage engine.
//!
//! Keeps file records and their chunks in memory and evaluates the same
//! native filter and sort documents a GridFS-style server would. Used for
//! tests and local development.

pub mod bucket;
pub(crate) mod filter;

pub use bucket::MemoryBucket;
