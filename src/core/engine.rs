use crate::core::{DownloadReport, DownloadTask};

pub struct DownloadEngine<T: DownloadTask> {
    task: T,
}

impl<T: DownloadTask> DownloadEngine<T> {
    pub fn new(task: T) -> Self {
        Self { task }
    }

    pub fn task(&self) -> &T {
        &self.task
    }

    pub async fn run(&self) -> DownloadReport {
        tracing::info!("Starting download: {}", self.task.describe());

        let report = self.task.run().await;

        if report.outcome.is_success() {
            tracing::info!(
                "Download finished: {:?}, {} bytes in {} ms",
                report.outcome,
                report.bytes,
                report.elapsed_ms
            );
        } else {
            tracing::error!(
                "Download failed: {:?} after {} ms",
                report.outcome,
                report.elapsed_ms
            );
        }

        report
    }
}
