use std::fmt;
use std::sync::Arc;

use super::progress::Progress;
use crate::error::{Error, Result};

/// Number of concurrent chunk workers used when none is configured.
pub const DEFAULT_CONCURRENCY: usize = 20;

/// Phases of a download operation.
///
/// Downloads progress through these phases in order:
/// Preflight → Planning → Downloading → Completed
///
/// Any phase may end in `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DownloadPhase {
    /// Probing the server for content length and range support.
    #[default]
    Preflight,

    /// Splitting the content length into chunks.
    Planning,

    /// Chunk workers are running.
    ///
    /// Reported once when dispatch begins and again after every body
    /// frame a worker writes to the sink.
    Downloading,

    /// Every chunk landed in the sink.
    Completed,

    /// The preflight or at least one chunk failed.
    Failed,
}

impl fmt::Display for DownloadPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadPhase::Preflight => write!(f, "Preflight"),
            DownloadPhase::Planning => write!(f, "Planning"),
            DownloadPhase::Downloading => write!(f, "Downloading"),
            DownloadPhase::Completed => write!(f, "Completed"),
            DownloadPhase::Failed => write!(f, "Failed"),
        }
    }
}

/// Callback invoked with progress snapshots. Must be cheap and non-blocking;
/// it runs on worker tasks.
pub type ProgressCallback = Arc<dyn Fn(&Progress) + Send + Sync>;

/// Configuration for a ranged download.
///
/// # Examples
///
/// ```
/// use rangefetch::DownloadOptions;
///
/// let options = DownloadOptions::default()
///     .concurrency(8)
///     .header("Authorization", "Bearer token");
/// assert_eq!(options.concurrency, 8);
/// ```
#[derive(Clone)]
pub struct DownloadOptions {
    /// Desired number of chunks, and so of concurrent range requests.
    ///
    /// Small files may be split into fewer chunks than this.
    ///
    /// Default: 20
    pub concurrency: usize,

    /// Custom HTTP headers sent with the preflight and every range request.
    ///
    /// Default: empty
    pub headers: Arc<[(String, String)]>,

    /// Progress callback.
    ///
    /// Default: None
    pub on_progress: Option<ProgressCallback>,
}

impl fmt::Debug for DownloadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadOptions")
            .field("concurrency", &self.concurrency)
            .field("headers", &self.headers)
            .field("on_progress", &self.on_progress.as_ref().map(|_| "{ ... }"))
            .finish()
    }
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            headers: Arc::new([]),
            on_progress: None,
        }
    }
}

impl DownloadOptions {
    #[must_use]
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Add a single custom HTTP header.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut headers: Vec<_> = self.headers.iter().cloned().collect();
        headers.push((key.into(), value.into()));
        self.headers = Arc::from(headers);
        self
    }

    /// Replace all custom headers.
    #[must_use]
    pub fn headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers = Arc::from(headers);
        self
    }

    #[must_use]
    pub fn on_progress(mut self, on_progress: ProgressCallback) -> Self {
        self.on_progress = Some(on_progress);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(Error::InvalidOptions(
                "concurrency must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}
