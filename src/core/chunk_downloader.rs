//! Range-based downloader for files of any size.
//!
//! The total size is discovered with a `HEAD` request, then the body is fetched
//! in consecutive `Range: bytes=X-Y` requests of at most `max_chunk_size` bytes
//! each. When the size cannot be discovered the file is fetched with a single
//! plain `GET` instead.

use crate::domain::model::{ChunkDownloadResult, DownloadRequest, DownloadToMemoryResult, Progress};
use crate::domain::ports::ProgressCallback;
use crate::utils::error::{DownloaderError, Result};
use bytes::Bytes;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, RANGE};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Upper bound on the buffer reserved up front for a single-request download.
const MAX_PAYLOAD_PREALLOC: u64 = 16 * 1024 * 1024;

/// Clones share cancellation state, so a clone handed to another task can
/// cancel the download running here.
#[derive(Debug, Clone)]
pub struct RuntimeChunkDownloader {
    client: Client,
    cancel_token: CancellationToken,
    active_downloads: Arc<AtomicUsize>,
}

impl Default for RuntimeChunkDownloader {
    fn default() -> Self {
        Self::new()
    }
}

impl RuntimeChunkDownloader {
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            cancel_token: CancellationToken::new(),
            active_downloads: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    pub fn is_in_progress(&self) -> bool {
        self.active_downloads.load(Ordering::SeqCst) > 0
    }

    /// Cancel the current download and every later one on this downloader.
    ///
    /// Returns whether a download was running at the time of the call.
    pub fn cancel_download(&self) -> bool {
        let was_running = self.is_in_progress();
        self.cancel_token.cancel();
        tracing::warn!("Download canceled");
        was_running
    }

    /// Download a whole file, choosing between chunked and single-request mode.
    pub async fn download_file(
        &self,
        request: &DownloadRequest,
        on_progress: Option<ProgressCallback>,
    ) -> ChunkDownloadResult {
        let _active = ActiveDownload::enter(&self.active_downloads);
        self.download_file_inner(request, on_progress).await
    }

    async fn download_file_inner(
        &self,
        request: &DownloadRequest,
        on_progress: Option<ProgressCallback>,
    ) -> ChunkDownloadResult {
        if self.is_cancelled() {
            tracing::warn!("Canceled file download from {}", request.url);
            return ChunkDownloadResult::failed(DownloadToMemoryResult::Cancelled);
        }

        match self.get_content_size(&request.url, request.timeout).await {
            Ok(content_size) => {
                tracing::debug!("Content size of {} is {} bytes", request.url, content_size);
                match self
                    .download_file_by_chunk(request, content_size, on_progress)
                    .await
                {
                    Ok(data) => ChunkDownloadResult {
                        data,
                        result: DownloadToMemoryResult::Success,
                    },
                    Err(e) => Self::failure(&request.url, e),
                }
            }
            Err(DownloaderError::Cancelled { .. }) => {
                ChunkDownloadResult::failed(DownloadToMemoryResult::Cancelled)
            }
            Err(e) => {
                tracing::warn!(
                    "Unable to get size of {} ({}), downloading it with a single request",
                    request.url,
                    e
                );
                match self.download_by_payload(request, on_progress).await {
                    Ok(data) if !data.is_empty() => ChunkDownloadResult {
                        data,
                        result: DownloadToMemoryResult::SucceededByPayload,
                    },
                    Ok(_) => {
                        tracing::error!("Failed to download file from {}: payload is empty", request.url);
                        ChunkDownloadResult::failed(DownloadToMemoryResult::DownloadFailed)
                    }
                    Err(e) => Self::failure(&request.url, e),
                }
            }
        }
    }

    fn failure(url: &str, error: DownloaderError) -> ChunkDownloadResult {
        match error {
            DownloaderError::Cancelled { .. } => {
                tracing::warn!("Canceled file download from {}", url);
                ChunkDownloadResult::failed(DownloadToMemoryResult::Cancelled)
            }
            e => {
                tracing::error!("Failed to download file from {}: {}", url, e);
                ChunkDownloadResult::failed(DownloadToMemoryResult::DownloadFailed)
            }
        }
    }

    /// Ask the server for the file size with a `HEAD` request.
    pub async fn get_content_size(&self, url: &str, timeout: Duration) -> Result<u64> {
        let builder = Self::apply_timeout(self.client.head(url), timeout);
        let response = self.send(builder, url).await?;

        if !response.status().is_success() {
            return Err(DownloaderError::HttpStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        // HEAD 回應沒有 body，只能讀標頭
        let content_length = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok())
            .ok_or_else(|| DownloaderError::ContentLength {
                url: url.to_string(),
                reason: "missing or invalid Content-Length header".to_string(),
            })?;

        if content_length == 0 {
            return Err(DownloaderError::ContentLength {
                url: url.to_string(),
                reason: "content length is 0".to_string(),
            });
        }

        Ok(content_length)
    }

    /// Fetch `content_size` bytes in consecutive ranges of at most
    /// `request.max_chunk_size` bytes.
    pub async fn download_file_by_chunk(
        &self,
        request: &DownloadRequest,
        content_size: u64,
        on_progress: Option<ProgressCallback>,
    ) -> Result<Vec<u8>> {
        let url = request.url.as_str();
        let max_chunk_size = request.max_chunk_size;

        if max_chunk_size == 0 {
            return Err(DownloaderError::InvalidConfigValueError {
                field: "max_chunk_size".to_string(),
                value: "0".to_string(),
                reason: "chunk size must be greater than 0".to_string(),
            });
        }

        if content_size == 0 {
            return Err(DownloaderError::ContentLength {
                url: url.to_string(),
                reason: "content length is 0".to_string(),
            });
        }

        let too_large = || DownloaderError::ContentLength {
            url: url.to_string(),
            reason: format!("{} bytes do not fit in memory on this platform", content_size),
        };
        let buffer_len = usize::try_from(content_size).map_err(|_| too_large())?;
        let mut data = Vec::new();
        data.try_reserve_exact(buffer_len).map_err(|_| too_large())?;
        data.resize(buffer_len, 0u8);

        let ranged = max_chunk_size < content_size;
        let mut range_start = 0u64;
        let mut range_end = content_size.min(max_chunk_size) - 1;

        loop {
            if self.is_cancelled() {
                return Err(DownloaderError::Cancelled {
                    url: url.to_string(),
                });
            }

            let mut builder = Self::apply_request_options(self.client.get(url), request);
            if ranged {
                builder = builder.header(RANGE, format!("bytes={}-{}", range_start, range_end));
                tracing::debug!(
                    "Requesting chunk {{{}; {}}} of {} bytes from {}",
                    range_start,
                    range_end,
                    content_size,
                    url
                );
            }

            let response = self.send(builder, url).await?;
            let status = response.status();
            if !status.is_success() {
                return Err(DownloaderError::HttpStatus {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }

            // 伺服器忽略 Range 時會以 200 回傳整個檔案
            let whole_body = ranged && status == StatusCode::OK;
            if whole_body && range_start != 0 {
                return Err(DownloaderError::ChunkOutOfRange {
                    url: url.to_string(),
                    reason: "server ignored the Range header".to_string(),
                });
            }

            let written = self
                .read_body_into(response, &mut data, range_start, content_size, url, on_progress.as_ref())
                .await?;

            if written == 0 {
                return Err(DownloaderError::ChunkOutOfRange {
                    url: url.to_string(),
                    reason: "received an empty chunk".to_string(),
                });
            }

            let downloaded = range_start + written;
            if downloaded >= content_size {
                break;
            }

            if !ranged || whole_body {
                return Err(DownloaderError::ChunkOutOfRange {
                    url: url.to_string(),
                    reason: format!(
                        "body ended after {} of {} bytes",
                        downloaded, content_size
                    ),
                });
            }

            let bytes_to_download = (content_size - downloaded).min(max_chunk_size);
            range_start = downloaded;
            range_end = downloaded + bytes_to_download - 1;
        }

        Ok(data)
    }

    /// Single `GET` without a known size; used when `HEAD` gives no length.
    async fn download_by_payload(
        &self,
        request: &DownloadRequest,
        on_progress: Option<ProgressCallback>,
    ) -> Result<Vec<u8>> {
        let url = request.url.as_str();
        let builder = Self::apply_request_options(self.client.get(url), request);
        let mut response = self.send(builder, url).await?;

        if !response.status().is_success() {
            return Err(DownloaderError::HttpStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        // 標頭長度不可信，只預留有限空間
        let announced_size = response.content_length().unwrap_or(0);
        let mut data = Vec::new();
        let _ = data.try_reserve(announced_size.min(MAX_PAYLOAD_PREALLOC) as usize);

        while let Some(piece) = self.next_piece(&mut response, url).await? {
            data.try_reserve(piece.len())
                .map_err(|_| DownloaderError::ContentLength {
                    url: url.to_string(),
                    reason: format!("payload larger than {} bytes does not fit in memory", data.len()),
                })?;
            data.extend_from_slice(&piece);
            if let Some(callback) = on_progress.as_ref() {
                let received = data.len() as u64;
                callback(Progress::new(received, announced_size.max(received)));
            }
        }

        Ok(data)
    }

    async fn read_body_into(
        &self,
        mut response: Response,
        data: &mut [u8],
        offset: u64,
        content_size: u64,
        url: &str,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<u64> {
        if offset >= data.len() as u64 {
            return Err(DownloaderError::ChunkOutOfRange {
                url: url.to_string(),
                reason: format!("data offset {} is out of range", offset),
            });
        }

        let mut received = 0u64;
        while let Some(piece) = self.next_piece(&mut response, url).await? {
            let start = offset + received;
            let end = start + piece.len() as u64;
            if end > content_size {
                return Err(DownloaderError::ChunkOutOfRange {
                    url: url.to_string(),
                    reason: format!(
                        "overall downloaded size {} exceeds content size {}",
                        end, content_size
                    ),
                });
            }

            data[start as usize..end as usize].copy_from_slice(&piece);
            received += piece.len() as u64;

            tracing::trace!(
                "Downloaded {} bytes of file chunk from {}. Overall: {}/{}",
                received,
                url,
                end,
                content_size
            );
            if let Some(callback) = on_progress {
                callback(Progress::new(end, content_size));
            }
        }

        Ok(received)
    }

    async fn next_piece(&self, response: &mut Response, url: &str) -> Result<Option<Bytes>> {
        tokio::select! {
            _ = self.cancel_token.cancelled() => Err(DownloaderError::Cancelled { url: url.to_string() }),
            piece = response.chunk() => Ok(piece?),
        }
    }

    async fn send(&self, builder: RequestBuilder, url: &str) -> Result<Response> {
        tokio::select! {
            _ = self.cancel_token.cancelled() => Err(DownloaderError::Cancelled { url: url.to_string() }),
            response = builder.send() => Ok(response?),
        }
    }

    fn apply_request_options(builder: RequestBuilder, request: &DownloadRequest) -> RequestBuilder {
        let builder = Self::apply_timeout(builder, request.timeout);
        match request.content_type.as_deref() {
            Some(content_type) if !content_type.is_empty() => builder.header(CONTENT_TYPE, content_type),
            _ => builder,
        }
    }

    fn apply_timeout(builder: RequestBuilder, timeout: Duration) -> RequestBuilder {
        if timeout.is_zero() {
            builder
        } else {
            builder.timeout(timeout)
        }
    }
}

/// Keeps the shared download counter raised for as long as it lives.
struct ActiveDownload<'a>(&'a AtomicUsize);

impl<'a> ActiveDownload<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for ActiveDownload<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
