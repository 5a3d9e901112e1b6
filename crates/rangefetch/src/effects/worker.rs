//! Single-chunk execution: one ranged GET streamed into the sink.

use std::io::{self, Write};
use std::sync::Arc;

use bytes::Bytes;
use futures_util::TryStreamExt;
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::{debug, warn};
use url::Url;

use crate::core::parse_content_range;
use crate::data::ByteRange;
use crate::effects::http::{BoxStream, HttpClient};
use crate::effects::sink::RandomAccessSink;
use crate::error::{Error, Result};

/// Sequential writer over a [`RandomAccessSink`] that starts at a fixed
/// offset and advances by however many bytes each `write_at` accepted.
///
/// Short writes are continued by [`io::Write::write_all`] immediately
/// after the last accepted byte.
pub struct ChunkWriter<S: ?Sized> {
    sink: Arc<S>,
    offset: u64,
}

impl<S: RandomAccessSink + ?Sized> ChunkWriter<S> {
    pub fn new(sink: Arc<S>, offset: u64) -> Self { Self { sink, offset } }

    /// Offset the next write will land at.
    pub fn offset(&self) -> u64 { self.offset }
}

impl<S: RandomAccessSink + ?Sized> Write for ChunkWriter<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.sink.write_at(buf, self.offset)?;
        self.offset += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> { Ok(()) }
}

/// Issue a ranged GET and return its body.
///
/// Anything but `206 Partial Content` is a protocol error: a full `200`
/// body would land at the wrong offsets. So is a `Content-Range` header
/// naming another interval. A 206 without `Content-Range` is accepted and
/// left to the body length check.
pub async fn fetch_range<C: HttpClient>(
    client: &C,
    url: &Url,
    range: ByteRange,
    headers: &[(String, String)],
) -> Result<BoxStream<'static, Result<Bytes>>> {
    let response = client
        .get_range(url, range, headers)
        .await
        .map_err(Error::transport)?;

    if response.status != 206 {
        return Err(Error::UnexpectedStatus {
            status: response.status,
        });
    }

    if let Some(content_range) = response.content_range
        && parse_content_range(&content_range) != Some((range.start, range.end))
    {
        return Err(Error::ContentRangeMismatch {
            expected: range,
            content_range,
        });
    }

    Ok(Box::pin(response.body.map_err(Error::transport)))
}

/// Download `range` of `url` into `sink` at `range.start`.
///
/// Returns the number of bytes written, which always equals `range.len()`
/// on success. `on_written` is called after every body frame lands.
/// Errors are wrapped in [`Error::Chunk`] carrying the range.
pub async fn run_chunk<C: HttpClient>(
    client: &C,
    url: &Url,
    range: ByteRange,
    sink: Arc<dyn RandomAccessSink>,
    headers: &[(String, String)],
    on_written: &(dyn Fn(u64) + Send + Sync),
) -> Result<u64> {
    debug!(chunk = range.index, "fetching bytes {range}");

    match copy_range(client, url, range, sink, headers, on_written).await {
        Ok(written) => {
            debug!(chunk = range.index, written, "finished bytes {range}");
            Ok(written)
        }
        Err(err) => {
            warn!(chunk = range.index, error = %err, "chunk {range} failed");
            Err(err.in_chunk(range))
        }
    }
}

async fn copy_range<C: HttpClient>(
    client: &C,
    url: &Url,
    range: ByteRange,
    sink: Arc<dyn RandomAccessSink>,
    headers: &[(String, String)],
    on_written: &(dyn Fn(u64) + Send + Sync),
) -> Result<u64> {
    let mut body = fetch_range(client, url, range, headers).await?;

    let expected = range.len();
    let offload = sink.may_block() && on_multi_thread_runtime();
    let mut writer = ChunkWriter::new(sink, range.start);
    let mut written = 0u64;

    while let Some(frame) = body.try_next().await? {
        let frame_len = frame.len() as u64;
        if frame_len > expected - written {
            // never spill into the neighbouring chunk
            return Err(Error::BodyLength {
                expected,
                actual: written + frame_len,
            });
        }

        let result = if offload {
            tokio::task::block_in_place(|| writer.write_all(&frame))
        } else {
            writer.write_all(&frame)
        };
        result.map_err(|source| Error::Write {
            offset: writer.offset(),
            source,
        })?;
        written += frame_len;
        on_written(frame_len);
    }

    if written != expected {
        return Err(Error::BodyLength {
            expected,
            actual: written,
        });
    }

    Ok(written)
}

fn on_multi_thread_runtime() -> bool {
    // block_in_place panics on the current-thread runtime
    Handle::try_current()
        .is_ok_and(|handle| handle.runtime_flavor() == RuntimeFlavor::MultiThread)
}
