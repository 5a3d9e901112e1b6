/// What a transport reports for the preflight (HEAD) request.
///
/// Header values are passed through raw; interpreting them is the job of
/// [`content_metadata`](crate::core::content_metadata).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProbeResponse {
    /// HTTP status code.
    pub status: u16,
    /// Parsed `Content-Length` header, if present and numeric.
    pub content_length: Option<u64>,
    /// Raw `Accept-Ranges` header value, if present.
    pub accept_ranges: Option<String>,
}

/// Content length and range capability of a remote file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentMetadata {
    pub total_length: u64,
    pub accepts_ranges: bool,
}
