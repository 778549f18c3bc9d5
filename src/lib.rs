pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::DownloaderConfig;

pub use adapters::storage::LocalStorage;
pub use core::{
    chunk_downloader::RuntimeChunkDownloader,
    engine::DownloadEngine,
    memory_downloader::{FileToMemoryDownloader, MemoryDownloadTask},
    storage_downloader::{FileToStorageDownloader, StorageDownloadTask},
};
pub use domain::model::{
    ChunkDownloadResult, DownloadOutcome, DownloadReport, DownloadRequest, DownloadToMemoryResult,
    DownloadToStorageResult, Progress, DEFAULT_MAX_CHUNK_SIZE,
};
pub use domain::ports::{DownloadTask, ProgressCallback, Storage};
pub use utils::error::{DownloaderError, Result};
