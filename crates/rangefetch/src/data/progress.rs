use crate::data::options::DownloadPhase;

/// Snapshot of a download, passed to progress callbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    /// Current phase of the download.
    pub phase: DownloadPhase,

    /// Bytes written to the sink so far, across all chunks.
    pub bytes_downloaded: u64,

    /// Content length reported by the preflight, once known.
    pub total_bytes: Option<u64>,

    /// Number of chunks in the plan (0 before planning).
    pub chunks_total: usize,

    /// Number of chunk workers that have finished, successfully or not.
    pub chunks_completed: usize,
}

impl Progress {
    /// Percentage of bytes written, if the total is known.
    #[must_use]
    pub fn percentage(&self) -> Option<f64> {
        self.total_bytes.map(|total| {
            if total == 0 {
                if self.is_completed() { 100.0 } else { 0.0 }
            } else {
                (self.bytes_downloaded as f64 / total as f64) * 100.0
            }
        })
    }

    #[must_use]
    pub fn is_completed(&self) -> bool { self.phase == DownloadPhase::Completed }
}
