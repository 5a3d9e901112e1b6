//! Random-access destinations for downloaded bytes.
//!
//! Every chunk worker writes into the same sink at its own offsets. The
//! planner guarantees that those offsets never overlap, so placement
//! needs no locking; a sink only has to keep its own bookkeeping sound
//! under concurrent calls.

use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

/// A destination that accepts writes at arbitrary offsets.
///
/// Implementations must be safe to call concurrently at disjoint offsets
/// and must grow to accommodate offsets past the current end; gaps are
/// filled with zeros.
pub trait RandomAccessSink: Send + Sync {
    /// Write `buf` starting at `offset`, returning how many bytes were
    /// accepted. A short count is allowed; callers continue from
    /// `offset + n`.
    fn write_at(&self, buf: &[u8], offset: u64) -> io::Result<usize>;

    /// Whether `write_at` may block the calling thread on I/O.
    ///
    /// Chunk workers running on a multi-threaded runtime move writes to
    /// such sinks out of the async scheduler with
    /// [`tokio::task::block_in_place`].
    fn may_block(&self) -> bool { false }
}

impl<T: RandomAccessSink + ?Sized> RandomAccessSink for Arc<T> {
    fn write_at(&self, buf: &[u8], offset: u64) -> io::Result<usize> {
        (**self).write_at(buf, offset)
    }

    fn may_block(&self) -> bool { (**self).may_block() }
}

/// A file written with positional I/O.
///
/// Uses `pwrite` on Unix and `seek_write` on Windows, so concurrent writers
/// never race on a shared cursor. Writes are blocking; see
/// [`RandomAccessSink::may_block`].
#[derive(Debug)]
pub struct FileSink {
    file: File,
}

impl FileSink {
    pub fn new(file: File) -> Self { Self { file } }

    /// Create (or truncate) the file at `path`.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        File::create(path).map(Self::new)
    }

    /// Flush data and metadata to disk.
    pub fn sync_all(&self) -> io::Result<()> { self.file.sync_all() }

    pub fn into_inner(self) -> File { self.file }
}

impl RandomAccessSink for FileSink {
    fn may_block(&self) -> bool { true }

    #[cfg(unix)]
    fn write_at(&self, buf: &[u8], offset: u64) -> io::Result<usize> {
        use std::os::unix::fs::FileExt;
        self.file.write_at(buf, offset)
    }

    #[cfg(windows)]
    fn write_at(&self, buf: &[u8], offset: u64) -> io::Result<usize> {
        use std::os::windows::fs::FileExt;
        self.file.seek_write(buf, offset)
    }
}

/// A growable in-memory buffer.
///
/// Writes past the end extend the buffer; chunks may arrive in any order.
#[derive(Debug, Default)]
pub struct MemorySink {
    data: Mutex<Vec<u8>>,
}

impl MemorySink {
    pub fn new() -> Self { Self::default() }

    /// Pre-allocate `capacity` bytes. The logical length stays 0.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Mutex::new(Vec::with_capacity(capacity)),
        }
    }

    pub fn len(&self) -> usize { self.lock().len() }

    pub fn is_empty(&self) -> bool { self.lock().is_empty() }

    /// Copy of the current contents.
    pub fn to_vec(&self) -> Vec<u8> { self.lock().clone() }

    pub fn into_inner(self) -> Vec<u8> {
        self.data.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<u8>> {
        // a panicking writer cannot leave the Vec itself inconsistent
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RandomAccessSink for MemorySink {
    fn write_at(&self, buf: &[u8], offset: u64) -> io::Result<usize> {
        let start = usize::try_from(offset)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "offset exceeds address space"))?;
        let end = start
            .checked_add(buf.len())
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "write end overflows"))?;

        let mut data = self.lock();
        if end > data.len() {
            data.resize(end, 0);
        }
        data[start..end].copy_from_slice(buf);
        Ok(buf.len())
    }
}
