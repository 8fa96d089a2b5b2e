//! User event ingestion
//!
//! Parses JSONL user events from stdin or a file.

pub mod stream;
pub mod types;

pub use stream::*;
pub use types::*;
