//! Capture file format parsers
//!
//! Each parser yields an iterator over `CapturedFrame` results so callers can
//! stream large captures without loading them whole.

pub mod candump;

// Re-export parser types
pub use candump::{CandumpFrameIterator, CandumpParser};
