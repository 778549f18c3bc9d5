use crate::utils::error::{DownloaderError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// 解析並檢查下載網址，只接受 http / https
pub fn parse_download_url(url_str: &str) -> Result<Url> {
    if url_str.trim().is_empty() {
        return Err(DownloaderError::InvalidUrl {
            url: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    let url = Url::parse(url_str).map_err(|e| DownloaderError::InvalidUrl {
        url: url_str.to_string(),
        reason: format!("Invalid URL format: {}", e),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(DownloaderError::InvalidUrl {
            url: url_str.to_string(),
            reason: format!("Unsupported URL scheme: {}", scheme),
        }),
    }
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    parse_download_url(url_str)
        .map(|_| ())
        .map_err(|e| match e {
            DownloaderError::InvalidUrl { url, reason } => DownloaderError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url,
                reason,
            },
            other => other,
        })
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(DownloaderError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(DownloaderError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(DownloaderError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| DownloaderError::MissingConfigError {
        field: field_name.to_string(),
    })
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(DownloaderError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_download_url() {
        assert!(parse_download_url("https://example.com/file.zip").is_ok());
        assert!(parse_download_url("http://example.com").is_ok());
        assert!(matches!(
            parse_download_url(""),
            Err(DownloaderError::InvalidUrl { .. })
        ));
        assert!(parse_download_url("   ").is_err());
        assert!(parse_download_url("not a url").is_err());
        assert!(parse_download_url("ftp://example.com/file").is_err());
    }

    #[test]
    fn test_validate_url_reports_field() {
        match validate_url("download.url", "ftp://example.com") {
            Err(DownloaderError::InvalidConfigValueError { field, .. }) => {
                assert_eq!(field, "download.url")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_validate_path() {
        assert!(validate_path("storage.base_path", "./downloads").is_ok());
        assert!(validate_path("storage.base_path", "").is_err());
        assert!(validate_path("storage.base_path", "a\0b").is_err());
    }

    #[test]
    fn test_validate_positive_number_and_range() {
        assert!(validate_positive_number("download.max_chunk_size", 1024, 1).is_ok());
        assert!(validate_positive_number("download.max_chunk_size", 0, 1).is_err());
        assert!(validate_range("download.timeout_seconds", 5.0, 0.0, 3600.0).is_ok());
        assert!(validate_range("download.timeout_seconds", -1.0, 0.0, 3600.0).is_err());
    }

    #[test]
    fn test_validate_required_field() {
        let present = Some(3u64);
        let missing: Option<u64> = None;
        assert_eq!(*validate_required_field("x", &present).unwrap(), 3);
        assert!(matches!(
            validate_required_field("x", &missing),
            Err(DownloaderError::MissingConfigError { .. })
        ));
    }
}
