use crate::domain::model::{DownloadReport, Progress};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

pub type ProgressCallback = Arc<dyn Fn(Progress) + Send + Sync>;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn create_dir_all(&self, path: &str) -> impl std::future::Future<Output = Result<()>> + Send;
    fn remove_file(&self, path: &str) -> impl std::future::Future<Output = Result<()>> + Send;
    fn exists(&self, path: &str) -> impl std::future::Future<Output = bool> + Send;
}

#[async_trait]
pub trait DownloadTask: Send + Sync {
    /// Short human-readable description used in logs.
    fn describe(&self) -> String;
    async fn run(&self) -> DownloadReport;
}
