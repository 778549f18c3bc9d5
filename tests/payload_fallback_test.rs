use runtime_files_downloader::{
    DownloadRequest, DownloadToMemoryResult, Progress, ProgressCallback, RuntimeChunkDownloader,
};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const HEAD_NOT_ALLOWED: &str =
    "HTTP/1.1 405 Method Not Allowed\r\ncontent-length: 0\r\nconnection: close\r\n\r\n";

/// Answers `HEAD` with 405 and every other request with `get_response`,
/// written verbatim so the framing headers are under the test's control.
async fn serve_raw(get_response: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = vec![0u8; 4096];
                let mut read = 0;
                while !buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf[read..]).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => read += n,
                    }
                }
                let response = if buf.starts_with(b"HEAD") {
                    HEAD_NOT_ALLOWED
                } else {
                    get_response
                };
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{}/file.bin", addr)
}

fn recorder() -> (ProgressCallback, Arc<Mutex<Vec<Progress>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let callback: ProgressCallback = Arc::new(move |progress: Progress| {
        sink.lock().unwrap().push(progress);
    });
    (callback, seen)
}

#[tokio::test]
async fn test_chunked_payload_progress_stays_within_size() {
    let url = serve_raw(
        "HTTP/1.1 200 OK\r\ntransfer-encoding: chunked\r\nconnection: close\r\n\r\n5\r\nhello\r\n6\r\n world\r\n0\r\n\r\n",
    )
    .await;

    let (on_progress, seen) = recorder();
    let downloader = RuntimeChunkDownloader::new();
    let result = downloader
        .download_file(&DownloadRequest::new(url), Some(on_progress))
        .await;

    assert_eq!(result.result, DownloadToMemoryResult::SucceededByPayload);
    assert_eq!(result.data, b"hello world");

    let seen = seen.lock().unwrap();
    assert!(!seen.is_empty());
    assert!(seen.iter().all(|p| p.bytes_received <= p.content_size));
    assert!(seen.iter().all(|p| p.ratio <= 1.0));
    let last = seen.last().unwrap();
    assert_eq!(last.bytes_received, 11);
    assert_eq!(last.content_size, 11);
}

#[tokio::test]
async fn test_huge_announced_payload_length_does_not_abort() {
    let url = serve_raw(
        "HTTP/1.1 200 OK\r\ncontent-length: 4611686018427387904\r\nconnection: close\r\n\r\nabc",
    )
    .await;

    let downloader = RuntimeChunkDownloader::new();
    let handle = tokio::spawn(async move {
        downloader
            .download_file(&DownloadRequest::new(url), None)
            .await
    });

    let result = handle.await.unwrap();

    // 連線在宣告長度之前就結束
    assert_eq!(result.result, DownloadToMemoryResult::DownloadFailed);
    assert!(result.data.is_empty());
}
