//! I/O for ranged downloads.
//!
//! The HTTP transport seam, random-access sinks, the chunk worker and the
//! orchestrating [`Downloader`].

mod downloader;
mod http;
mod sink;
mod worker;

pub use downloader::{Downloader, download};
pub use http::{BoxStream, HttpClient, RangeResponse};
pub use sink::{FileSink, MemorySink, RandomAccessSink};
pub use worker::{ChunkWriter, fetch_range, run_chunk};

#[cfg(feature = "reqwest")]
pub use http::{ReqwestClient, ReqwestClientBuilder};
