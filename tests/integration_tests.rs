use httpmock::prelude::*;
use httpmock::Method::HEAD;
use runtime_files_downloader::{
    DownloadEngine, DownloadOutcome, DownloadToMemoryResult, DownloadToStorageResult,
    FileToMemoryDownloader, FileToStorageDownloader, LocalStorage, MemoryDownloadTask, Progress,
    ProgressCallback, StorageDownloadTask,
};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

fn large_payload() -> Vec<u8> {
    (0..10_000u32).map(|i| (i % 251) as u8).collect()
}

/// Serves `payload` honouring `Range` requests in `chunk`-sized steps.
fn serve_ranged(server: &MockServer, path: &str, payload: &[u8], chunk: usize) {
    server.mock(|when, then| {
        when.method(HEAD).path(path.to_string());
        then.status(200)
            .header("content-length", payload.len().to_string())
            .body(payload.to_vec());
    });

    let mut start = 0;
    while start < payload.len() {
        let end = (start + chunk).min(payload.len()) - 1;
        server.mock(|when, then| {
            when.method(GET)
                .path(path.to_string())
                .header("range", format!("bytes={}-{}", start, end));
            then.status(206).body(payload[start..=end].to_vec());
        });
        start = end + 1;
    }
}

#[tokio::test]
async fn test_end_to_end_storage_download_with_chunks() {
    let temp_dir = TempDir::new().unwrap();
    let payload = large_payload();

    let server = MockServer::start();
    serve_ranged(&server, "/assets/level.pak", &payload, 4096);

    let seen = Arc::new(Mutex::new(Vec::<Progress>::new()));
    let sink = seen.clone();
    let on_progress: ProgressCallback = Arc::new(move |progress: Progress| {
        sink.lock().unwrap().push(progress);
    });

    let memory_downloader = FileToMemoryDownloader::new().with_max_chunk_size(4096);
    let downloader = FileToStorageDownloader::with_memory_downloader(
        LocalStorage::new(temp_dir.path()),
        memory_downloader,
    );
    let task = StorageDownloadTask::new(
        downloader,
        server.url("/assets/level.pak"),
        "cache/level.pak",
        10.0,
        None,
        Some(on_progress),
    );

    let report = DownloadEngine::new(task).run().await;

    assert_eq!(
        report.outcome,
        DownloadOutcome::Storage(DownloadToStorageResult::Success)
    );
    assert_eq!(report.bytes, payload.len() as u64);
    assert_eq!(report.target.as_deref(), Some("cache/level.pak"));
    assert!(report.finished_at >= report.started_at);

    let saved = std::fs::read(temp_dir.path().join("cache/level.pak")).unwrap();
    assert_eq!(saved, payload);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.last().map(|p| p.bytes_received), Some(payload.len() as u64));
}

#[tokio::test]
async fn test_end_to_end_memory_download_report_serializes() {
    let payload = large_payload();
    let server = MockServer::start();
    serve_ranged(&server, "/data.bin", &payload, 3000);

    let task = MemoryDownloadTask::new(
        FileToMemoryDownloader::new().with_max_chunk_size(3000),
        server.url("/data.bin"),
        10.0,
        None,
        None,
    );
    let engine = DownloadEngine::new(task);

    let report = engine.run().await;

    assert_eq!(
        report.outcome,
        DownloadOutcome::Memory(DownloadToMemoryResult::Success)
    );
    assert_eq!(engine.task().take_payload().unwrap(), payload);
    // 取走之後不再保留
    assert!(engine.task().take_payload().is_none());

    let json: serde_json::Value = serde_json::to_value(&report).unwrap();
    assert_eq!(json["outcome"], "success");
    assert_eq!(json["bytes"], 10_000);
    assert!(json["target"].is_null());
}

#[tokio::test]
async fn test_end_to_end_with_server_failure() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.path("/gone.bin");
        then.status(410);
    });

    let downloader = FileToStorageDownloader::new(LocalStorage::new(temp_dir.path()));
    let task = StorageDownloadTask::new(
        downloader,
        server.url("/gone.bin"),
        "gone.bin",
        5.0,
        None,
        None,
    );

    let report = DownloadEngine::new(task).run().await;

    assert_eq!(
        report.outcome,
        DownloadOutcome::Storage(DownloadToStorageResult::DownloadFailed)
    );
    assert_eq!(report.bytes, 0);
    assert!(!temp_dir.path().join("gone.bin").exists());
}
