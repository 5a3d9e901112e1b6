use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::task::{Context, Poll};

use futures_util::{FutureExt, StreamExt, stream::FuturesUnordered};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info};
use url::Url;

use crate::core::{content_metadata, plan_chunks};
use crate::data::{ContentMetadata, DownloadOptions, DownloadPhase, Progress, ProgressCallback};
use crate::effects::http::HttpClient;
use crate::effects::sink::RandomAccessSink;
use crate::effects::worker::run_chunk;
use crate::error::{Error, Result};

/// Downloads one remote file as concurrent byte ranges.
///
/// Each call to [`download`](Self::download) is independent; the
/// downloader holds only the client and options.
pub struct Downloader<C: HttpClient> {
    client: Arc<C>,
    options: DownloadOptions,
}

impl<C: HttpClient> Downloader<C> {
    pub fn new(client: C) -> Self { Self::from_arc(Arc::new(client)) }

    /// Share an existing client between downloaders.
    pub fn from_arc(client: Arc<C>) -> Self {
        Self {
            client,
            options: DownloadOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: DownloadOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &DownloadOptions { &self.options }

    /// Probe `url` for its content length and range support.
    pub async fn preflight(&self, url: &Url) -> Result<ContentMetadata> {
        let probe = self
            .client
            .probe(url, &self.options.headers)
            .await
            .map_err(Error::transport)?;
        debug!(
            %url,
            status = probe.status,
            content_length = ?probe.content_length,
            accept_ranges = ?probe.accept_ranges,
            "preflight response"
        );
        content_metadata(&probe)
    }

    /// Download `url` into `sink`.
    ///
    /// Probes the server, splits the content into at most
    /// `options.concurrency` ranges, fetches them all concurrently and
    /// waits for every worker before returning. The first chunk error is
    /// returned; other chunks are neither retried nor cancelled. On error
    /// the failed ranges of the sink are left in an undefined state.
    ///
    /// Dropping the returned future aborts every worker still running, so
    /// no write starts after the drop.
    pub async fn download(&self, url: &Url, sink: Arc<dyn RandomAccessSink>) -> Result<()> {
        self.options.validate()?;

        let mut tracker = Tracker::new(self.options.on_progress.clone());
        tracker.emit(DownloadPhase::Preflight);

        let meta = match self.preflight(url).await {
            Ok(meta) => meta,
            Err(err) => {
                tracker.emit(DownloadPhase::Failed);
                return Err(err);
            }
        };

        tracker.total_bytes = Some(meta.total_length);
        tracker.emit(DownloadPhase::Planning);

        let chunks = plan_chunks(meta.total_length, self.options.concurrency);
        info!(
            %url,
            total_length = meta.total_length,
            chunks = chunks.len(),
            "starting ranged download"
        );

        if chunks.is_empty() {
            tracker.emit(DownloadPhase::Completed);
            return Ok(());
        }

        tracker.chunks_total = chunks.len();
        let tracker = Arc::new(tracker);
        tracker.emit(DownloadPhase::Downloading);

        let mut workers = FuturesUnordered::new();
        for range in chunks {
            let client = Arc::clone(&self.client);
            let url = url.clone();
            let sink = Arc::clone(&sink);
            let headers = Arc::clone(&self.options.headers);
            let tracker = Arc::clone(&tracker);

            let handle = tokio::spawn(async move {
                let on_written = |n: u64| tracker.add_bytes(n);
                let outcome = run_chunk(&*client, &url, range, sink, &headers, &on_written).await;
                tracker.chunk_done();
                outcome
            });
            workers.push(WorkerHandle(handle).map(move |joined| (range, joined)));
        }

        // drain every worker even after a failure so nothing is still
        // writing into the sink once we return
        let mut first_error = None;
        while let Some((range, joined)) = workers.next().await {
            let outcome = joined
                .map_err(|e| Error::Worker(e).in_chunk(range))
                .and_then(|written| written);
            if let Err(err) = outcome
                && first_error.is_none()
            {
                first_error = Some(err);
            }
        }

        match first_error {
            None => {
                tracker.emit(DownloadPhase::Completed);
                info!(%url, total_length = meta.total_length, "download complete");
                Ok(())
            }
            Some(err) => {
                tracker.emit(DownloadPhase::Failed);
                Err(err)
            }
        }
    }
}

/// Download `url` into `sink` with `concurrency` workers and default options.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use rangefetch::{FileSink, ReqwestClient, Url, download};
///
/// # async fn run() -> rangefetch::Result<()> {
/// let url = Url::parse("https://example.com/big.iso").unwrap();
/// let sink = Arc::new(FileSink::create("big.iso").unwrap());
/// download(ReqwestClient::new()?, &url, sink, 20).await
/// # }
/// ```
pub async fn download<C: HttpClient>(
    client: C,
    url: &Url,
    sink: Arc<dyn RandomAccessSink>,
    concurrency: usize,
) -> Result<()> {
    Downloader::new(client)
        .with_options(DownloadOptions::default().concurrency(concurrency))
        .download(url, sink)
        .await
}

/// Join handle that aborts its task when dropped unfinished.
struct WorkerHandle<T>(JoinHandle<T>);

impl<T> Future for WorkerHandle<T> {
    type Output = std::result::Result<T, JoinError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.0).poll(cx)
    }
}

impl<T> Drop for WorkerHandle<T> {
    fn drop(&mut self) { self.0.abort(); }
}

/// Shared progress state for one download call.
struct Tracker {
    callback: Option<ProgressCallback>,
    total_bytes: Option<u64>,
    chunks_total: usize,
    bytes: AtomicU64,
    completed: AtomicUsize,
}

impl Tracker {
    fn new(callback: Option<ProgressCallback>) -> Self {
        Self {
            callback,
            total_bytes: None,
            chunks_total: 0,
            bytes: AtomicU64::new(0),
            completed: AtomicUsize::new(0),
        }
    }

    fn add_bytes(&self, n: u64) {
        self.bytes.fetch_add(n, Ordering::Relaxed);
        self.emit(DownloadPhase::Downloading);
    }

    fn chunk_done(&self) { self.completed.fetch_add(1, Ordering::Relaxed); }

    fn emit(&self, phase: DownloadPhase) {
        if let Some(ref callback) = self.callback {
            callback(&Progress {
                phase,
                bytes_downloaded: self.bytes.load(Ordering::Relaxed),
                total_bytes: self.total_bytes,
                chunks_total: self.chunks_total,
                chunks_completed: self.completed.load(Ordering::Relaxed),
            });
        }
    }
}
