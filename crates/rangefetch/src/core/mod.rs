//! Pure transformations for ranged downloads.
//!
//! Chunk planning and interpretation of preflight and range headers.
//! No I/O happens here.

mod metadata;
mod plan;

pub use metadata::{accepts_byte_ranges, content_metadata, parse_content_range};
pub use plan::plan_chunks;
