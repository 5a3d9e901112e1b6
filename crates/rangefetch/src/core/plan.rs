use crate::data::ByteRange;

/// Split `total_length` bytes into contiguous inclusive ranges for
/// parallel download.
///
/// A cursor walks from 0; every chunk ends at
/// `min(cursor + total_length / concurrency, total_length - 1)` and the
/// next one starts right after it. The remainder of the integer division
/// stays on the trailing chunks rather than being spread out, and a file
/// shorter than `concurrency` gets one single-byte chunk per byte.
///
/// A zero-length file yields no chunks. A `concurrency` of 0 is treated
/// as 1.
///
/// # Examples
///
/// ```
/// use rangefetch::plan_chunks;
///
/// let chunks = plan_chunks(1028, 20);
/// assert_eq!(chunks.len(), 20);
/// assert_eq!((chunks[0].start, chunks[0].end), (0, 51));
/// assert_eq!((chunks[19].start, chunks[19].end), (988, 1027));
///
/// assert!(plan_chunks(0, 4).is_empty());
/// ```
pub fn plan_chunks(total_length: u64, concurrency: usize) -> Vec<ByteRange> {
    if total_length == 0 {
        return Vec::new();
    }

    let concurrency = concurrency.max(1) as u64;
    let step = total_length / concurrency;
    let last = total_length - 1;

    let mut chunks = Vec::with_capacity(concurrency.min(total_length) as usize);
    let mut cursor = 0u64;
    while cursor < total_length {
        let end = cursor.saturating_add(step).min(last);
        chunks.push(ByteRange::new(chunks.len(), cursor, end));
        cursor = end + 1;
    }

    chunks
}
