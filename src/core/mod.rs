pub mod chunk_downloader;
pub mod engine;
pub mod memory_downloader;
pub mod storage_downloader;

pub use crate::domain::model::{
    ChunkDownloadResult, DownloadOutcome, DownloadReport, DownloadRequest, DownloadToMemoryResult,
    DownloadToStorageResult, Progress, DEFAULT_MAX_CHUNK_SIZE,
};
pub use crate::domain::ports::{DownloadTask, ProgressCallback, Storage};
pub use crate::utils::error::Result;
