use std::fmt;

/// One chunk of a download: an inclusive byte interval of the remote file.
///
/// `end` is inclusive, matching the `Range: bytes=start-end` header form,
/// so a range always covers at least one byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ByteRange {
    /// Chunk index within its plan (0-based).
    pub index: usize,
    /// First byte offset.
    pub start: u64,
    /// Last byte offset (inclusive).
    pub end: u64,
}

impl ByteRange {
    pub fn new(index: usize, start: u64, end: u64) -> Self {
        debug_assert!(start <= end, "inclusive range {start}-{end} is empty");
        Self { index, start, end }
    }

    /// Number of bytes covered by this range.
    #[must_use]
    pub fn len(&self) -> u64 { self.end - self.start + 1 }

    /// Always `false`; present for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool { false }

    #[must_use]
    pub fn contains(&self, offset: u64) -> bool { self.start <= offset && offset <= self.end }

    /// Value for the HTTP `Range` request header.
    ///
    /// ```
    /// use rangefetch::ByteRange;
    ///
    /// assert_eq!(ByteRange::new(0, 0, 51).header_value(), "bytes=0-51");
    /// ```
    #[must_use]
    pub fn header_value(&self) -> String { format!("bytes={}-{}", self.start, self.end) }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}
