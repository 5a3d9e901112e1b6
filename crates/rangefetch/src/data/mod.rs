//! Immutable data types for ranged downloads.
//!
//! Configuration, chunk descriptors and progress snapshots. Nothing here
//! performs I/O.

pub mod metadata;
pub mod options;
pub mod progress;
pub mod range;

pub use metadata::{ContentMetadata, ProbeResponse};
pub use options::{DEFAULT_CONCURRENCY, DownloadOptions, DownloadPhase, ProgressCallback};
pub use progress::Progress;
pub use range::ByteRange;
