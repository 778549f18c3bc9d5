use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Largest chunk requested by default, matching a 32-bit signed buffer limit.
pub const DEFAULT_MAX_CHUNK_SIZE: u64 = i32::MAX as u64;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Progress {
    pub bytes_received: u64,
    pub content_size: u64,
    pub ratio: f32,
}

impl Progress {
    pub fn new(bytes_received: u64, content_size: u64) -> Self {
        let ratio = if content_size == 0 {
            0.0
        } else {
            bytes_received as f32 / content_size as f32
        };
        Self {
            bytes_received,
            content_size,
            ratio,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadToMemoryResult {
    Success,
    /// Size lookup failed, but a plain GET delivered the payload.
    SucceededByPayload,
    Cancelled,
    DownloadFailed,
    InvalidUrl,
}

impl DownloadToMemoryResult {
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success | Self::SucceededByPayload)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadToStorageResult {
    Success,
    SucceededByPayload,
    Cancelled,
    DownloadFailed,
    SaveFailed,
    DirectoryCreationFailed,
    InvalidUrl,
    InvalidSavePath,
}

impl DownloadToStorageResult {
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success | Self::SucceededByPayload)
    }
}

impl From<DownloadToMemoryResult> for DownloadToStorageResult {
    fn from(result: DownloadToMemoryResult) -> Self {
        match result {
            DownloadToMemoryResult::Success => Self::Success,
            DownloadToMemoryResult::SucceededByPayload => Self::SucceededByPayload,
            DownloadToMemoryResult::Cancelled => Self::Cancelled,
            DownloadToMemoryResult::DownloadFailed => Self::DownloadFailed,
            DownloadToMemoryResult::InvalidUrl => Self::InvalidUrl,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChunkDownloadResult {
    pub data: Vec<u8>,
    pub result: DownloadToMemoryResult,
}

impl ChunkDownloadResult {
    pub fn failed(result: DownloadToMemoryResult) -> Self {
        Self {
            data: Vec::new(),
            result,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: String,
    /// Zero means no per-request timeout.
    pub timeout: Duration,
    pub content_type: Option<String>,
    pub max_chunk_size: u64,
}

impl DownloadRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: Duration::ZERO,
            content_type: None,
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_content_type(mut self, content_type: Option<String>) -> Self {
        self.content_type = content_type.filter(|value| !value.is_empty());
        self
    }

    pub fn with_max_chunk_size(mut self, max_chunk_size: u64) -> Self {
        self.max_chunk_size = max_chunk_size;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DownloadOutcome {
    Memory(DownloadToMemoryResult),
    Storage(DownloadToStorageResult),
}

impl DownloadOutcome {
    pub fn is_success(self) -> bool {
        match self {
            DownloadOutcome::Memory(result) => result.is_success(),
            DownloadOutcome::Storage(result) => result.is_success(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DownloadReport {
    pub url: String,
    /// Save path for storage downloads, `None` for in-memory downloads.
    pub target: Option<String>,
    pub outcome: DownloadOutcome,
    pub bytes: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}
