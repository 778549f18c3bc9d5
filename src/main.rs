use anyhow::Context;
use clap::Parser;
use runtime_files_downloader::utils::error::ErrorSeverity;
use runtime_files_downloader::utils::{
    logger,
    validation::{validate_required_field, Validate},
};
use runtime_files_downloader::{
    CliConfig, DownloadEngine, DownloadOutcome, DownloadReport, DownloadToMemoryResult,
    DownloadToStorageResult, DownloaderConfig, FileToMemoryDownloader, FileToStorageDownloader,
    LocalStorage, MemoryDownloadTask, Progress, ProgressCallback, StorageDownloadTask,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let mut config = match &cli.config {
        Some(path) => DownloaderConfig::from_file(path)
            .with_context(|| format!("Failed to load config file '{}'", path))?,
        None => DownloaderConfig::default(),
    };
    cli.apply_to(&mut config);

    // 初始化日誌
    if config.log_json() {
        logger::init_json_logger(cli.verbose, config.logging.level.as_deref());
    } else {
        logger::init_cli_logger(cli.verbose, config.logging.level.as_deref());
    }
    tracing::debug!("Effective config: {:?}", config);

    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        tracing::error!("Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let url = match validate_required_field("download.url", &config.download.url) {
        Ok(url) => url.clone(),
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Pass a URL as the first argument or set download.url in the config file");
            std::process::exit(1);
        }
    };

    let memory_downloader =
        FileToMemoryDownloader::new().with_max_chunk_size(config.max_chunk_size());

    // Ctrl-C 取消下載
    let canceller = memory_downloader.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            canceller.cancel_download();
        }
    });

    let timeout = config.timeout_seconds();
    let content_type = config.content_type().map(str::to_string);
    let on_progress = progress_logger();

    let report = match config.storage.save_path.clone() {
        Some(save_path) => {
            let storage = LocalStorage::new(config.base_path());
            let downloader =
                FileToStorageDownloader::with_memory_downloader(storage, memory_downloader);
            let task = StorageDownloadTask::new(
                downloader,
                url,
                save_path,
                timeout,
                content_type,
                Some(on_progress),
            );
            DownloadEngine::new(task).run().await
        }
        None => {
            let task = MemoryDownloadTask::new(
                memory_downloader,
                url,
                timeout,
                content_type,
                Some(on_progress),
            );
            let engine = DownloadEngine::new(task);
            let report = engine.run().await;

            if !cli.json {
                if let Some(payload) = engine.task().take_payload() {
                    let mut stdout = tokio::io::stdout();
                    stdout.write_all(&payload).await?;
                    stdout.flush().await?;
                }
            }
            report
        }
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if let Some(target) = &report.target {
        if report.outcome.is_success() {
            eprintln!("✅ Saved {} bytes to {}", report.bytes, target);
        }
    }

    let exit_code = exit_code(&report);
    if exit_code != 0 {
        eprintln!("❌ Download ended with {:?}", report.outcome);
        std::process::exit(exit_code);
    }

    Ok(())
}

/// Logs progress at every 10% step.
fn progress_logger() -> ProgressCallback {
    let last_decile = Arc::new(AtomicU32::new(0));
    Arc::new(move |progress: Progress| {
        let decile = (progress.ratio * 10.0).floor() as u32;
        if decile > last_decile.fetch_max(decile, Ordering::Relaxed) {
            tracing::info!(
                "{:>3.0}% ({} / {} bytes)",
                progress.ratio * 100.0,
                progress.bytes_received,
                progress.content_size
            );
        }
    })
}

fn exit_code(report: &DownloadReport) -> i32 {
    if report.outcome.is_success() {
        return 0;
    }

    let severity = match report.outcome {
        DownloadOutcome::Memory(DownloadToMemoryResult::Cancelled)
        | DownloadOutcome::Storage(DownloadToStorageResult::Cancelled) => ErrorSeverity::Low,
        DownloadOutcome::Memory(DownloadToMemoryResult::InvalidUrl)
        | DownloadOutcome::Storage(
            DownloadToStorageResult::InvalidUrl | DownloadToStorageResult::InvalidSavePath,
        ) => ErrorSeverity::High,
        DownloadOutcome::Storage(
            DownloadToStorageResult::SaveFailed | DownloadToStorageResult::DirectoryCreationFailed,
        ) => ErrorSeverity::Critical,
        _ => ErrorSeverity::Medium,
    };

    match severity {
        ErrorSeverity::Low => 130,    // 使用者取消
        ErrorSeverity::Medium => 2,   // 下載錯誤，可重試
        ErrorSeverity::High => 1,     // 輸入錯誤
        ErrorSeverity::Critical => 3, // 寫入失敗
    }
}
