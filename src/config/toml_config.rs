use crate::domain::model::DEFAULT_MAX_CHUNK_SIZE;
use crate::utils::error::{DownloaderError, Result};
use crate::utils::validation::Validate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_TIMEOUT_SECONDS: f32 = 5.0;
const MAX_TIMEOUT_SECONDS: f32 = 86_400.0;
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DownloaderConfig {
    #[serde(default)]
    pub download: DownloadSection,
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DownloadSection {
    pub url: Option<String>,
    pub timeout_seconds: Option<f32>,
    pub content_type: Option<String>,
    pub max_chunk_size: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageSection {
    pub base_path: Option<String>,
    pub save_path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingSection {
    pub level: Option<String>,
    pub json: Option<bool>,
}

impl DownloaderConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| DownloaderError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DOWNLOAD_URL})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| DownloaderError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn timeout_seconds(&self) -> f32 {
        self.download
            .timeout_seconds
            .unwrap_or(DEFAULT_TIMEOUT_SECONDS)
    }

    pub fn max_chunk_size(&self) -> u64 {
        self.download.max_chunk_size.unwrap_or(DEFAULT_MAX_CHUNK_SIZE)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.download
            .content_type
            .as_deref()
            .filter(|value| !value.is_empty())
    }

    pub fn base_path(&self) -> &str {
        self.storage.base_path.as_deref().unwrap_or(".")
    }

    pub fn log_json(&self) -> bool {
        self.logging.json.unwrap_or(false)
    }
}

impl Validate for DownloaderConfig {
    fn validate(&self) -> Result<()> {
        use crate::utils::validation::*;

        if let Some(url) = &self.download.url {
            validate_url("download.url", url)?;
        }

        if let Some(timeout) = self.download.timeout_seconds {
            validate_range("download.timeout_seconds", timeout, 0.0, MAX_TIMEOUT_SECONDS)?;
        }

        if let Some(max_chunk_size) = self.download.max_chunk_size {
            validate_positive_number("download.max_chunk_size", max_chunk_size, 1)?;
        }

        if let Some(base_path) = &self.storage.base_path {
            validate_path("storage.base_path", base_path)?;
        }

        if let Some(save_path) = &self.storage.save_path {
            validate_path("storage.save_path", save_path)?;
        }

        if let Some(level) = &self.logging.level {
            if !LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
                return Err(DownloaderError::InvalidConfigValueError {
                    field: "logging.level".to_string(),
                    value: level.clone(),
                    reason: format!("Unsupported level. Valid levels: {}", LOG_LEVELS.join(", ")),
                });
            }
        }

        Ok(())
    }
}
