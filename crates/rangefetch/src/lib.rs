//! Concurrent HTTP range downloading into random-access sinks.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - Immutable configuration and types
//! - [`core`] - Pure transformations (chunk planning, preflight checks)
//! - `effects` - I/O operations behind the [`HttpClient`] and
//!   [`RandomAccessSink`] traits
//!
//! # Flow
//!
//! A HEAD preflight reports the content length and whether the server
//! accepts byte ranges. The length is split into contiguous inclusive
//! ranges, one `Range: bytes=s-e` GET is spawned per range, and each
//! response body is written straight to its offset in the sink. Every
//! worker runs to completion; the first failure becomes the result.
//!
//! ```no_run
//! use std::sync::Arc;
//! use rangefetch::{DownloadOptions, Downloader, MemorySink, ReqwestClient, Url};
//!
//! # async fn run() -> rangefetch::Result<()> {
//! let sink = Arc::new(MemorySink::new());
//! Downloader::new(ReqwestClient::new()?)
//!     .with_options(DownloadOptions::default().concurrency(8))
//!     .download(&Url::parse("https://example.com/file").unwrap(), sink.clone())
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod data;
mod effects;
mod error;

pub use crate::core::plan_chunks;
pub use data::{
    ByteRange, ContentMetadata, DEFAULT_CONCURRENCY, DownloadOptions, DownloadPhase, ProbeResponse,
    Progress, ProgressCallback,
};
pub use effects::{
    BoxStream, ChunkWriter, Downloader, FileSink, HttpClient, MemorySink, RandomAccessSink,
    RangeResponse, download, fetch_range, run_chunk,
};
pub use url::Url;

#[cfg(feature = "reqwest")]
pub use effects::{ReqwestClient, ReqwestClientBuilder};

pub use error::{BoxError, Error, ErrorKind, Result};
