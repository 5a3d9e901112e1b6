use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use once_cell::sync::Lazy;
use rangefetch::{DownloadPhase, Progress, ProgressCallback};

const PB_STYLE: &str = "{spinner:.blue} {prefix:>12.cyan.bold} [{elapsed_precise}] {wide_bar:.cyan/blue} {bytes}/{total_bytes} ({bytes_per_sec}, {eta}) {msg}";

const TICK: &str = "⠁⠂⠄⡀⢀⠠⠐⠈ ";

const PB_CHARS: &str = "█▓▒░  ";

static PB_TEMPLATE: Lazy<Option<ProgressStyle>> = Lazy::new(|| {
    ProgressStyle::with_template(PB_STYLE)
        .ok()
        .map(|style| style.tick_chars(TICK).progress_chars(PB_CHARS))
});

/// Terminal progress bar fed by download progress snapshots.
#[derive(Clone)]
pub struct ProgressTracker {
    pb: ProgressBar,
}

impl ProgressTracker {
    pub fn new(prefix: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        let pb = match PB_TEMPLATE.as_ref() {
            Some(style) => pb.with_style(style.clone()),
            None => pb,
        };
        pb.set_prefix(prefix.to_string());
        Self { pb }
    }

    pub fn update(&self, progress: &Progress) {
        match progress.phase {
            DownloadPhase::Preflight => self.pb.set_message("probing"),
            DownloadPhase::Planning => {
                if let Some(total) = progress.total_bytes {
                    self.pb.set_length(total);
                }
            }
            DownloadPhase::Downloading => {
                // snapshots from different workers may arrive out of order
                if progress.bytes_downloaded > self.pb.position() {
                    self.pb.set_position(progress.bytes_downloaded);
                }
                self.pb.set_message(format!(
                    "{}/{} chunks",
                    progress.chunks_completed, progress.chunks_total
                ));
            }
            DownloadPhase::Completed => {
                self.pb.set_position(progress.bytes_downloaded);
                self.pb.finish_with_message("done");
            }
            DownloadPhase::Failed => self.pb.abandon_with_message("failed"),
        }
    }

    pub fn callback(&self) -> ProgressCallback {
        let tracker = self.clone();
        Arc::new(move |progress: &Progress| tracker.update(progress))
    }
}
