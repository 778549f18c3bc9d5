use crate::core::chunk_downloader::RuntimeChunkDownloader;
use crate::domain::model::{
    DownloadOutcome, DownloadReport, DownloadRequest, DownloadToMemoryResult, DEFAULT_MAX_CHUNK_SIZE,
};
use crate::domain::ports::{DownloadTask, ProgressCallback};
use crate::utils::validation::parse_download_url;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Downloads a file into RAM and hands back the bytes.
#[derive(Debug, Clone)]
pub struct FileToMemoryDownloader {
    chunk_downloader: RuntimeChunkDownloader,
    max_chunk_size: u64,
}

impl Default for FileToMemoryDownloader {
    fn default() -> Self {
        Self::new()
    }
}

impl FileToMemoryDownloader {
    pub fn new() -> Self {
        Self::with_chunk_downloader(RuntimeChunkDownloader::new())
    }

    pub fn with_chunk_downloader(chunk_downloader: RuntimeChunkDownloader) -> Self {
        Self {
            chunk_downloader,
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
        }
    }

    pub fn with_max_chunk_size(mut self, max_chunk_size: u64) -> Self {
        self.max_chunk_size = max_chunk_size;
        self
    }

    /// `timeout` is in seconds; negative values are clamped to 0 (no timeout).
    pub async fn download_file_to_memory(
        &self,
        url: &str,
        timeout: f32,
        content_type: Option<&str>,
        on_progress: Option<ProgressCallback>,
    ) -> (Vec<u8>, DownloadToMemoryResult) {
        if let Err(e) = parse_download_url(url) {
            tracing::error!("{}", e);
            return (Vec::new(), DownloadToMemoryResult::InvalidUrl);
        }

        let request = DownloadRequest::new(url)
            .with_timeout(clamp_timeout(timeout))
            .with_content_type(content_type.map(str::to_string))
            .with_max_chunk_size(self.max_chunk_size);

        let result = self.chunk_downloader.download_file(&request, on_progress).await;
        if result.result.is_success() {
            tracing::debug!("Downloaded {} bytes from {} to memory", result.data.len(), url);
        }
        (result.data, result.result)
    }

    pub fn cancel_download(&self) -> bool {
        self.chunk_downloader.cancel_download()
    }
}

/// Seconds to [`Duration`], warning about and clamping negative values.
pub(crate) fn clamp_timeout(timeout: f32) -> Duration {
    if timeout.is_nan() || timeout < 0.0 {
        tracing::warn!("The specified timeout ({}) is less than 0, setting it to 0", timeout);
        return Duration::ZERO;
    }
    Duration::try_from_secs_f32(timeout).unwrap_or(Duration::ZERO)
}

/// A memory download bound to its arguments so [`crate::DownloadEngine`] can drive it.
pub struct MemoryDownloadTask {
    downloader: FileToMemoryDownloader,
    url: String,
    timeout: f32,
    content_type: Option<String>,
    on_progress: Option<ProgressCallback>,
    payload: Mutex<Option<Vec<u8>>>,
}

impl MemoryDownloadTask {
    pub fn new(
        downloader: FileToMemoryDownloader,
        url: impl Into<String>,
        timeout: f32,
        content_type: Option<String>,
        on_progress: Option<ProgressCallback>,
    ) -> Self {
        Self {
            downloader,
            url: url.into(),
            timeout,
            content_type,
            on_progress,
            payload: Mutex::new(None),
        }
    }

    /// Bytes of the last successful run.
    pub fn take_payload(&self) -> Option<Vec<u8>> {
        self.payload.lock().ok().and_then(|mut payload| payload.take())
    }
}

#[async_trait]
impl DownloadTask for MemoryDownloadTask {
    fn describe(&self) -> String {
        format!("{} -> memory", self.url)
    }

    async fn run(&self) -> DownloadReport {
        let started_at = Utc::now();
        let clock = Instant::now();

        let (data, result) = self
            .downloader
            .download_file_to_memory(
                &self.url,
                self.timeout,
                self.content_type.as_deref(),
                self.on_progress.clone(),
            )
            .await;

        let bytes = data.len() as u64;
        if result.is_success() {
            if let Ok(mut payload) = self.payload.lock() {
                *payload = Some(data);
            }
        }

        DownloadReport {
            url: self.url.clone(),
            target: None,
            outcome: DownloadOutcome::Memory(result),
            bytes,
            started_at,
            finished_at: Utc::now(),
            elapsed_ms: clock.elapsed().as_millis() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_timeout() {
        assert_eq!(clamp_timeout(-3.0), Duration::ZERO);
        assert_eq!(clamp_timeout(f32::NAN), Duration::ZERO);
        assert_eq!(clamp_timeout(0.0), Duration::ZERO);
        assert_eq!(clamp_timeout(2.5), Duration::from_millis(2500));
    }

    #[tokio::test]
    async fn test_invalid_url_short_circuits() {
        let downloader = FileToMemoryDownloader::new();
        let (data, result) = downloader.download_file_to_memory("", 5.0, None, None).await;
        assert!(data.is_empty());
        assert_eq!(result, DownloadToMemoryResult::InvalidUrl);

        let (_, result) = downloader
            .download_file_to_memory("file:///etc/hosts", 5.0, None, None)
            .await;
        assert_eq!(result, DownloadToMemoryResult::InvalidUrl);
    }

    #[tokio::test]
    async fn test_cancel_without_download_reports_idle() {
        let downloader = FileToMemoryDownloader::new();
        assert!(!downloader.cancel_download());
    }
}
