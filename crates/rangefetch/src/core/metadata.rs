use crate::data::{ContentMetadata, ProbeResponse};
use crate::error::{Error, Result};

/// Returns `true` if an `Accept-Ranges` header value advertises byte ranges.
///
/// The header is a comma-separated token list; `bytes` is matched
/// case-insensitively. `none` and unknown units do not qualify.
///
/// # Examples
///
/// ```
/// use rangefetch::core::accepts_byte_ranges;
///
/// assert!(accepts_byte_ranges("bytes"));
/// assert!(!accepts_byte_ranges("none"));
/// ```
pub fn accepts_byte_ranges(accept_ranges: &str) -> bool {
    accept_ranges
        .split(',')
        .any(|unit| unit.trim().eq_ignore_ascii_case("bytes"))
}

/// Parse the interval of a `Content-Range: bytes <start>-<end>/<total>`
/// value. The total may be `*`. Returns `None` for any other form,
/// including the unsatisfied `bytes */<total>`.
///
/// # Examples
///
/// ```
/// use rangefetch::core::parse_content_range;
///
/// assert_eq!(parse_content_range("bytes 52-103/1028"), Some((52, 103)));
/// assert_eq!(parse_content_range("bytes */1028"), None);
/// ```
pub fn parse_content_range(content_range: &str) -> Option<(u64, u64)> {
    let (unit, rest) = content_range.trim().split_once(' ')?;
    if !unit.eq_ignore_ascii_case("bytes") {
        return None;
    }
    let (interval, total) = rest.trim().split_once('/')?;
    if total != "*" && total.parse::<u64>().is_err() {
        return None;
    }
    let (start, end) = interval.split_once('-')?;
    let (start, end): (u64, u64) = (start.parse().ok()?, end.parse().ok()?);
    (start <= end).then_some((start, end))
}

/// Interpret a preflight response into the metadata a plan needs.
///
/// Fails with a protocol error unless the status is 2xx, a content length
/// is present, and the server accepts byte ranges.
pub fn content_metadata(probe: &ProbeResponse) -> Result<ContentMetadata> {
    if !(200..300).contains(&probe.status) {
        return Err(Error::PreflightStatus(probe.status));
    }

    let accepts_ranges = probe
        .accept_ranges
        .as_deref()
        .is_some_and(accepts_byte_ranges);
    if !accepts_ranges {
        return Err(Error::RangeNotSupported {
            accept_ranges: probe.accept_ranges.clone(),
        });
    }

    let total_length = probe.content_length.ok_or(Error::MissingContentLength)?;

    Ok(ContentMetadata {
        total_length,
        accepts_ranges,
    })
}
