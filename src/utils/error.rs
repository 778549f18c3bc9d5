use thiserror::Error;

#[derive(Error, Debug)]
pub enum DownloaderError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Unexpected HTTP status {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Unable to determine content length of {url}: {reason}")]
    ContentLength { url: String, reason: String },

    #[error("Chunk from {url} is out of range: {reason}")]
    ChunkOutOfRange { url: String, reason: String },

    #[error("Download from {url} was cancelled")]
    Cancelled { url: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Storage,
    Configuration,
    Input,
    Protocol,
    Cancellation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl DownloaderError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            DownloaderError::HttpError(_) | DownloaderError::HttpStatus { .. } => {
                ErrorCategory::Network
            }
            DownloaderError::IoError(_) => ErrorCategory::Storage,
            DownloaderError::ConfigError { .. }
            | DownloaderError::MissingConfigError { .. }
            | DownloaderError::InvalidConfigValueError { .. }
            | DownloaderError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            DownloaderError::InvalidUrl { .. } => ErrorCategory::Input,
            DownloaderError::ContentLength { .. } | DownloaderError::ChunkOutOfRange { .. } => {
                ErrorCategory::Protocol
            }
            DownloaderError::Cancelled { .. } => ErrorCategory::Cancellation,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Cancellation => ErrorSeverity::Low,
            ErrorCategory::Network | ErrorCategory::Protocol => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Input => ErrorSeverity::High,
            ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check the network connection and that the server is reachable",
            ErrorCategory::Protocol => {
                "The server may not report Content-Length or support Range requests; try a larger --max-chunk-size"
            }
            ErrorCategory::Storage => "Check that the save path is writable and the disk has free space",
            ErrorCategory::Configuration => "Review the configuration file and command-line flags",
            ErrorCategory::Input => "Provide a non-empty http(s) URL and a valid save path",
            ErrorCategory::Cancellation => "The download was cancelled; run it again to restart",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            DownloaderError::HttpError(e) if e.is_timeout() => {
                "The download timed out".to_string()
            }
            DownloaderError::HttpError(e) if e.is_connect() => {
                "Could not connect to the server".to_string()
            }
            DownloaderError::HttpStatus { status, .. } => {
                format!("The server answered with status {}", status)
            }
            DownloaderError::Cancelled { .. } => "The download was cancelled".to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DownloaderError>;
