//! Error types for rangefetch.

use std::io;

use thiserror::Error;

use crate::data::ByteRange;

/// Boxed error produced by an [`HttpClient`](crate::HttpClient) implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The HTTP client failed: connection refused, timeout, reset.
    Transport,
    /// The server answered, but not in the way a ranged download requires.
    Protocol,
    /// The sink rejected or failed a write.
    Write,
    /// The download was configured with invalid options.
    Config,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("transport error: {0}")]
    Transport(#[source] BoxError),

    #[error("preflight request failed with status {0}")]
    PreflightStatus(u16),

    #[error("server did not report a content length")]
    MissingContentLength,

    #[error(
        "server does not support range requests (Accept-Ranges: {})",
        accept_ranges.as_deref().unwrap_or("<absent>")
    )]
    RangeNotSupported { accept_ranges: Option<String> },

    #[error("expected status 206 Partial Content, got {status}")]
    UnexpectedStatus { status: u16 },

    #[error("expected Content-Range for bytes {expected}, got `{content_range}`")]
    ContentRangeMismatch {
        expected: ByteRange,
        content_range: String,
    },

    #[error("response body length mismatch: expected {expected} bytes, got {actual}")]
    BodyLength { expected: u64, actual: u64 },

    #[error("write failed at offset {offset}: {source}")]
    Write {
        offset: u64,
        #[source]
        source: io::Error,
    },

    #[error("invalid options: {0}")]
    InvalidOptions(String),

    #[error("chunk worker failed: {0}")]
    Worker(#[source] tokio::task::JoinError),

    #[error("chunked request for bytes {range} failed: {source}")]
    Chunk {
        range: ByteRange,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub(crate) fn transport<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Transport(Box::new(err))
    }

    pub(crate) fn in_chunk(self, range: ByteRange) -> Self {
        Error::Chunk {
            range,
            source: Box::new(self),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Transport(_) | Error::Worker(_) => ErrorKind::Transport,
            Error::PreflightStatus(_)
            | Error::MissingContentLength
            | Error::RangeNotSupported { .. }
            | Error::UnexpectedStatus { .. }
            | Error::ContentRangeMismatch { .. }
            | Error::BodyLength { .. } => ErrorKind::Protocol,
            Error::Write { .. } => ErrorKind::Write,
            Error::InvalidOptions(_) => ErrorKind::Config,
            Error::Chunk { source, .. } => source.kind(),
        }
    }

    /// The byte range of the failing chunk, if the error came from a worker.
    pub fn chunk_range(&self) -> Option<ByteRange> {
        match self {
            Error::Chunk { range, .. } => Some(*range),
            _ => None,
        }
    }
}
