use crate::core::memory_downloader::FileToMemoryDownloader;
use crate::domain::model::{DownloadOutcome, DownloadReport, DownloadToStorageResult};
use crate::domain::ports::{DownloadTask, ProgressCallback, Storage};
use async_trait::async_trait;
use chrono::Utc;
use std::path::Path;
use std::time::Instant;

/// Downloads a file and saves it through a [`Storage`] backend.
#[derive(Debug, Clone)]
pub struct FileToStorageDownloader<S: Storage> {
    storage: S,
    memory_downloader: FileToMemoryDownloader,
}

impl<S: Storage> FileToStorageDownloader<S> {
    pub fn new(storage: S) -> Self {
        Self::with_memory_downloader(storage, FileToMemoryDownloader::new())
    }

    pub fn with_memory_downloader(storage: S, memory_downloader: FileToMemoryDownloader) -> Self {
        Self {
            storage,
            memory_downloader,
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub async fn download_file_to_storage(
        &self,
        url: &str,
        save_path: &str,
        timeout: f32,
        content_type: Option<&str>,
        on_progress: Option<ProgressCallback>,
    ) -> DownloadToStorageResult {
        self.download_and_save(url, save_path, timeout, content_type, on_progress)
            .await
            .0
    }

    /// Like [`Self::download_file_to_storage`], also returning how many bytes were saved.
    pub async fn download_and_save(
        &self,
        url: &str,
        save_path: &str,
        timeout: f32,
        content_type: Option<&str>,
        on_progress: Option<ProgressCallback>,
    ) -> (DownloadToStorageResult, u64) {
        if url.is_empty() {
            tracing::error!("You have not provided an URL to download the file");
            return (DownloadToStorageResult::InvalidUrl, 0);
        }

        if save_path.is_empty() {
            tracing::error!("You have not provided a path to save the file");
            return (DownloadToStorageResult::InvalidSavePath, 0);
        }

        let (data, result) = self
            .memory_downloader
            .download_file_to_memory(url, timeout, content_type, on_progress)
            .await;

        if !result.is_success() {
            return (result.into(), 0);
        }

        if data.is_empty() {
            tracing::error!("An error occurred while downloading the file to storage");
            return (DownloadToStorageResult::DownloadFailed, 0);
        }

        if let Err(failure) = self.save(save_path, &data).await {
            return (failure, 0);
        }

        tracing::info!("Saved {} bytes from {} to '{}'", data.len(), url, save_path);
        (result.into(), data.len() as u64)
    }

    async fn save(&self, save_path: &str, data: &[u8]) -> Result<(), DownloadToStorageResult> {
        // 目錄不存在時先建立
        let parent = Path::new(save_path)
            .parent()
            .and_then(|dir| dir.to_str())
            .filter(|dir| !dir.is_empty());
        if let Some(dir) = parent {
            if !self.storage.exists(dir).await {
                if let Err(e) = self.storage.create_dir_all(dir).await {
                    tracing::error!(
                        "Unable to create a directory '{}' to save the downloaded file: {}",
                        dir,
                        e
                    );
                    return Err(DownloadToStorageResult::DirectoryCreationFailed);
                }
            }
        }

        if self.storage.exists(save_path).await {
            if let Err(e) = self.storage.remove_file(save_path).await {
                tracing::error!(
                    "Something went wrong while deleting the existing file '{}': {}",
                    save_path,
                    e
                );
                return Err(DownloadToStorageResult::SaveFailed);
            }
        }

        if let Err(e) = self.storage.write_file(save_path, data).await {
            tracing::error!(
                "Something went wrong while writing the response data to the file '{}': {}",
                save_path,
                e
            );
            return Err(DownloadToStorageResult::SaveFailed);
        }

        Ok(())
    }

    pub fn cancel_download(&self) -> bool {
        self.memory_downloader.cancel_download()
    }
}

/// A storage download bound to its arguments so [`crate::DownloadEngine`] can drive it.
pub struct StorageDownloadTask<S: Storage> {
    downloader: FileToStorageDownloader<S>,
    url: String,
    save_path: String,
    timeout: f32,
    content_type: Option<String>,
    on_progress: Option<ProgressCallback>,
}

impl<S: Storage> StorageDownloadTask<S> {
    pub fn new(
        downloader: FileToStorageDownloader<S>,
        url: impl Into<String>,
        save_path: impl Into<String>,
        timeout: f32,
        content_type: Option<String>,
        on_progress: Option<ProgressCallback>,
    ) -> Self {
        Self {
            downloader,
            url: url.into(),
            save_path: save_path.into(),
            timeout,
            content_type,
            on_progress,
        }
    }
}

#[async_trait]
impl<S: Storage> DownloadTask for StorageDownloadTask<S> {
    fn describe(&self) -> String {
        format!("{} -> {}", self.url, self.save_path)
    }

    async fn run(&self) -> DownloadReport {
        let started_at = Utc::now();
        let clock = Instant::now();

        let (result, bytes) = self
            .downloader
            .download_and_save(
                &self.url,
                &self.save_path,
                self.timeout,
                self.content_type.as_deref(),
                self.on_progress.clone(),
            )
            .await;

        DownloadReport {
            url: self.url.clone(),
            target: Some(self.save_path.clone()),
            outcome: DownloadOutcome::Storage(result),
            bytes,
            started_at,
            finished_at: Utc::now(),
            elapsed_ms: clock.elapsed().as_millis() as u64,
        }
    }
}
