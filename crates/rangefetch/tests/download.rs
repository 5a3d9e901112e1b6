//! End-to-end download tests against an in-process range-honoring client.

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use futures_util::StreamExt;
use rand::RngCore;
use rangefetch::{
    ByteRange, DownloadOptions, DownloadPhase, Downloader, Error, ErrorKind, MemorySink,
    ProbeResponse, Progress, RandomAccessSink, RangeResponse, Url, download,
};
use tokio::sync::Barrier;

#[derive(Debug)]
struct TestError(String);

impl std::fmt::Display for TestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for TestError {}

/// Serves `data` the way a range-capable HTTP server would.
struct RangeServer {
    data: Arc<Vec<u8>>,
    accept_ranges: Option<&'static str>,
    probe_fails: bool,
    /// Chunk index answered with `200 OK` and the whole file.
    full_content_for: Option<usize>,
    frame_size: usize,
    frame_delay: Duration,
    barrier: Option<Arc<Barrier>>,
    probes: AtomicUsize,
    gets: AtomicUsize,
    seen_headers: Mutex<Vec<Vec<(String, String)>>>,
}

impl RangeServer {
    fn new(data: Vec<u8>) -> Self {
        Self {
            data: Arc::new(data),
            accept_ranges: Some("bytes"),
            probe_fails: false,
            full_content_for: None,
            frame_size: 16,
            frame_delay: Duration::ZERO,
            barrier: None,
            probes: AtomicUsize::new(0),
            gets: AtomicUsize::new(0),
            seen_headers: Mutex::new(Vec::new()),
        }
    }
}

impl rangefetch::HttpClient for RangeServer {
    type Error = TestError;

    async fn probe(
        &self,
        _url: &Url,
        headers: &[(String, String)],
    ) -> Result<ProbeResponse, Self::Error> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.seen_headers.lock().unwrap().push(headers.to_vec());
        if self.probe_fails {
            return Err(TestError("connection refused".into()));
        }
        Ok(ProbeResponse {
            status: 200,
            content_length: Some(self.data.len() as u64),
            accept_ranges: self.accept_ranges.map(str::to_owned),
        })
    }

    async fn get_range(
        &self,
        _url: &Url,
        range: ByteRange,
        headers: &[(String, String)],
    ) -> Result<RangeResponse<Self::Error>, Self::Error> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.seen_headers.lock().unwrap().push(headers.to_vec());
        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }

        let (status, content_range, body) = if self.full_content_for == Some(range.index) {
            (200, None, self.data.to_vec())
        } else {
            let slice = &self.data[range.start as usize..=range.end as usize];
            let content_range = format!("bytes {range}/{}", self.data.len());
            (206, Some(content_range), slice.to_vec())
        };

        let delay = self.frame_delay;
        let frames: Vec<Result<Bytes, TestError>> = body
            .chunks(self.frame_size)
            .map(|frame| Ok(Bytes::copy_from_slice(frame)))
            .collect();
        let body = futures_util::stream::iter(frames)
            .then(move |frame| async move {
                tokio::time::sleep(delay).await;
                frame
            })
            .boxed();

        Ok(RangeResponse {
            status,
            content_range,
            body,
        })
    }
}

/// Counts writes so tests can check nothing lands after `download` returns.
#[derive(Default)]
struct CountingSink {
    inner: MemorySink,
    writes: AtomicUsize,
}

impl RandomAccessSink for CountingSink {
    fn write_at(&self, buf: &[u8], offset: u64) -> io::Result<usize> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.write_at(buf, offset)
    }
}

fn random_bytes(len: usize) -> Vec<u8> {
    let mut data = vec![0u8; len];
    rand::rng().fill_bytes(&mut data);
    data
}

fn test_url() -> Url { Url::parse("http://localhost/file.bin").unwrap() }

async fn fetch(
    server: &Arc<RangeServer>,
    sink: Arc<dyn RandomAccessSink>,
    concurrency: usize,
) -> rangefetch::Result<()> {
    Downloader::from_arc(Arc::clone(server))
        .with_options(DownloadOptions::default().concurrency(concurrency))
        .download(&test_url(), sink)
        .await
}

#[tokio::test]
async fn test_round_trip_across_concurrency() {
    let data = random_bytes(1028);

    for concurrency in [1, 2, 20, data.len() + 5] {
        let server = Arc::new(RangeServer::new(data.clone()));
        let sink = Arc::new(MemorySink::new());

        fetch(&server, sink.clone(), concurrency)
            .await
            .unwrap_or_else(|e| panic!("concurrency {concurrency}: {e}"));

        assert_eq!(sink.len(), data.len(), "concurrency {concurrency}");
        assert!(sink.to_vec() == data, "content mismatch at concurrency {concurrency}");
        assert_eq!(server.probes.load(Ordering::SeqCst), 1);
        assert_eq!(
            server.gets.load(Ordering::SeqCst),
            rangefetch::plan_chunks(data.len() as u64, concurrency).len()
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_1028_bytes_20_workers_multi_thread() {
    let data = random_bytes(1028);
    let mut server = RangeServer::new(data.clone());
    server.frame_size = 7;
    server.frame_delay = Duration::from_millis(1);
    let server = Arc::new(server);
    let sink = Arc::new(MemorySink::new());

    fetch(&server, sink.clone(), 20).await.unwrap();

    assert_eq!(server.gets.load(Ordering::SeqCst), 20);
    assert!(sink.to_vec() == data);
}

#[tokio::test]
async fn test_free_function_download() {
    let data = random_bytes(4096);
    let sink = Arc::new(MemorySink::new());

    download(RangeServer::new(data.clone()), &test_url(), sink.clone(), 7)
        .await
        .unwrap();

    assert!(sink.to_vec() == data);
}

#[tokio::test]
async fn test_zero_length_makes_no_range_requests() {
    let server = Arc::new(RangeServer::new(Vec::new()));
    let sink = Arc::new(MemorySink::new());

    fetch(&server, sink.clone(), 20).await.unwrap();

    assert_eq!(server.probes.load(Ordering::SeqCst), 1);
    assert_eq!(server.gets.load(Ordering::SeqCst), 0);
    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_missing_accept_ranges_is_protocol_error() {
    let mut server = RangeServer::new(random_bytes(64));
    server.accept_ranges = None;
    let server = Arc::new(server);

    let err = fetch(&server, Arc::new(MemorySink::new()), 4)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Protocol);
    assert!(matches!(err, Error::RangeNotSupported { .. }));
    assert_eq!(server.gets.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_preflight_transport_error() {
    let mut server = RangeServer::new(random_bytes(64));
    server.probe_fails = true;
    let server = Arc::new(server);

    let err = fetch(&server, Arc::new(MemorySink::new()), 4)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(err.chunk_range().is_none());
    assert_eq!(server.gets.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_zero_concurrency_rejected_before_network() {
    let server = Arc::new(RangeServer::new(random_bytes(64)));

    let err = fetch(&server, Arc::new(MemorySink::new()), 0)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Config);
    assert_eq!(server.probes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_full_content_chunk_fails_while_siblings_finish() {
    let data = random_bytes(1000);
    let mut server = RangeServer::new(data.clone());
    server.full_content_for = Some(3);
    server.frame_delay = Duration::from_millis(2);
    let server = Arc::new(server);
    let sink = Arc::new(CountingSink::default());

    let err = fetch(&server, sink.clone(), 10).await.unwrap_err();

    let chunks = rangefetch::plan_chunks(1000, 10);
    let failed = chunks[3];
    assert_eq!(err.kind(), ErrorKind::Protocol);
    assert_eq!(err.chunk_range(), Some(failed));
    assert!(err.to_string().contains(&format!("bytes {failed}")));
    assert_eq!(server.gets.load(Ordering::SeqCst), chunks.len());

    let writes_at_return = sink.writes.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(sink.writes.load(Ordering::SeqCst), writes_at_return);

    let written = sink.inner.to_vec();
    assert_eq!(written.len(), data.len());
    for chunk in chunks.iter().filter(|c| c.index != failed.index) {
        let (s, e) = (chunk.start as usize, chunk.end as usize);
        assert!(written[s..=e] == data[s..=e], "chunk {chunk} incomplete");
    }
    let (s, e) = (failed.start as usize, failed.end as usize);
    assert!(written[s..=e].iter().all(|&b| b == 0), "200 body leaked into sink");
}

#[tokio::test]
async fn test_all_chunks_dispatched_before_any_completes() {
    let data = random_bytes(500);
    let chunks = rangefetch::plan_chunks(500, 5).len();
    let mut server = RangeServer::new(data.clone());
    // every GET blocks until all of them have been issued
    server.barrier = Some(Arc::new(Barrier::new(chunks)));
    let server = Arc::new(server);
    let sink = Arc::new(MemorySink::new());

    tokio::time::timeout(
        Duration::from_secs(5),
        fetch(&server, sink.clone(), 5),
    )
    .await
    .expect("workers were not dispatched concurrently")
    .unwrap();

    assert!(sink.to_vec() == data);
}

#[tokio::test]
async fn test_headers_sent_with_every_request() {
    let server = Arc::new(RangeServer::new(random_bytes(100)));
    let downloader = Downloader::from_arc(Arc::clone(&server)).with_options(
        DownloadOptions::default()
            .concurrency(4)
            .header("Authorization", "Bearer token"),
    );

    downloader
        .download(&test_url(), Arc::new(MemorySink::new()))
        .await
        .unwrap();

    let seen = server.seen_headers.lock().unwrap();
    assert_eq!(seen.len(), 1 + 4);
    for headers in seen.iter() {
        assert_eq!(
            headers,
            &vec![("Authorization".to_string(), "Bearer token".to_string())]
        );
    }
}

#[tokio::test]
async fn test_progress_reports_phases_and_bytes() {
    let data = random_bytes(300);
    let server = Arc::new(RangeServer::new(data.clone()));
    let events: Arc<Mutex<Vec<Progress>>> = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&events);

    Downloader::from_arc(Arc::clone(&server))
        .with_options(
            DownloadOptions::default()
                .concurrency(3)
                .on_progress(Arc::new(move |p: &Progress| {
                    recorder.lock().unwrap().push(p.clone());
                })),
        )
        .download(&test_url(), Arc::new(MemorySink::new()))
        .await
        .unwrap();

    let events = events.lock().unwrap();
    assert_eq!(events.first().map(|p| p.phase), Some(DownloadPhase::Preflight));
    assert!(events.iter().any(|p| p.phase == DownloadPhase::Planning));

    let last = events.last().unwrap();
    assert_eq!(last.phase, DownloadPhase::Completed);
    assert_eq!(last.bytes_downloaded, 300);
    assert_eq!(last.total_bytes, Some(300));
    assert_eq!(last.chunks_total, 3);
    assert_eq!(last.chunks_completed, 3);
    assert_eq!(last.percentage(), Some(100.0));

    let downloading: Vec<_> = events
        .iter()
        .filter(|p| p.phase == DownloadPhase::Downloading)
        .map(|p| p.bytes_downloaded)
        .collect();
    assert!(downloading.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test]
async fn test_failed_download_reports_failed_phase() {
    let mut server = RangeServer::new(random_bytes(100));
    server.full_content_for = Some(0);
    let server = Arc::new(server);
    let last_phase = Arc::new(Mutex::new(None));
    let recorder = Arc::clone(&last_phase);

    let result = Downloader::from_arc(Arc::clone(&server))
        .with_options(
            DownloadOptions::default()
                .concurrency(2)
                .on_progress(Arc::new(move |p: &Progress| {
                    *recorder.lock().unwrap() = Some(p.phase);
                })),
        )
        .download(&test_url(), Arc::new(MemorySink::new()))
        .await;

    assert!(result.is_err());
    assert_eq!(*last_phase.lock().unwrap(), Some(DownloadPhase::Failed));
}

#[tokio::test]
async fn test_dropping_download_stops_every_worker() {
    let data = random_bytes(200);
    let mut server = RangeServer::new(data);
    server.frame_size = 1;
    server.frame_delay = Duration::from_millis(5);
    let server = Arc::new(server);
    let sink = Arc::new(CountingSink::default());

    let outcome = tokio::time::timeout(
        Duration::from_millis(30),
        fetch(&server, sink.clone(), 4),
    )
    .await;
    assert!(outcome.is_err(), "download should still be running at the deadline");

    let writes_at_drop = sink.writes.load(Ordering::SeqCst);
    assert!(writes_at_drop < 200);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(sink.writes.load(Ordering::SeqCst), writes_at_drop);
}
