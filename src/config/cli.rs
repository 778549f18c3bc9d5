use crate::config::toml_config::DownloaderConfig;
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, Parser)]
#[command(name = "rfd")]
#[command(about = "Download files over HTTP in chunks, to memory or to disk")]
pub struct CliConfig {
    /// URL of the file to download
    pub url: Option<String>,

    /// Save path; without it the payload is written to stdout
    #[arg(short, long)]
    pub output: Option<String>,

    /// Request timeout in seconds, 0 disables it
    #[arg(long)]
    pub timeout: Option<f32>,

    /// Value sent in the Content-Type header
    #[arg(long)]
    pub content_type: Option<String>,

    /// Largest byte range requested at once
    #[arg(long)]
    pub max_chunk_size: Option<u64>,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Print the download report as JSON")]
    pub json: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,
}

impl CliConfig {
    /// 命令列參數覆蓋設定檔
    pub fn apply_to(&self, config: &mut DownloaderConfig) {
        if let Some(url) = &self.url {
            config.download.url = Some(url.clone());
        }
        if let Some(output) = &self.output {
            config.storage.save_path = Some(output.clone());
        }
        if let Some(timeout) = self.timeout {
            config.download.timeout_seconds = Some(timeout);
        }
        if let Some(content_type) = &self.content_type {
            config.download.content_type = Some(content_type.clone());
        }
        if let Some(max_chunk_size) = self.max_chunk_size {
            config.download.max_chunk_size = Some(max_chunk_size);
        }
        if self.log_json {
            config.logging.json = Some(true);
        }
    }
}
