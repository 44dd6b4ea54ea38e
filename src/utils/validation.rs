use crate::utils::error::{LensError, Result};
use url::Url;
use uuid::Uuid;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(LensError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(LensError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(LensError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(LensError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(LensError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(LensError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(LensError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(LensError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// 尚未被環境變數替換的 `${VAR}` 佔位符
pub fn validate_no_placeholder(field_name: &str, value: &str) -> Result<()> {
    if value.contains("${") {
        return Err(LensError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Environment variable placeholder was not substituted".to_string(),
        });
    }
    Ok(())
}

pub fn validate_s3_bucket_name(field_name: &str, bucket_name: &str) -> Result<()> {
    if bucket_name.is_empty() {
        return Err(LensError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: bucket_name.to_string(),
            reason: "S3 bucket name cannot be empty".to_string(),
        });
    }

    if bucket_name.len() < 3 || bucket_name.len() > 63 {
        return Err(LensError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: bucket_name.to_string(),
            reason: "S3 bucket name must be between 3 and 63 characters".to_string(),
        });
    }

    if !bucket_name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
    {
        return Err(LensError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: bucket_name.to_string(),
            reason: "S3 bucket name can only contain lowercase letters, numbers, hyphens, and dots"
                .to_string(),
        });
    }

    if bucket_name.starts_with('-') || bucket_name.ends_with('-') {
        return Err(LensError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: bucket_name.to_string(),
            reason: "S3 bucket name cannot start or end with a hyphen".to_string(),
        });
    }

    Ok(())
}

pub fn validate_aws_region(field_name: &str, region: &str) -> Result<()> {
    validate_non_empty_string(field_name, region)?;

    if !region
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(LensError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: region.to_string(),
            reason: "AWS region can only contain lowercase letters, numbers, and hyphens"
                .to_string(),
        });
    }

    Ok(())
}

/// 路徑上的 event/photo id 必須是 UUID，回傳正規化 (hyphenated) 形式
pub fn parse_resource_id(field_name: &str, raw: &str) -> Result<String> {
    Uuid::parse_str(raw)
        .map(|id| id.to_string())
        .map_err(|_| LensError::invalid_input(field_name, "expected a UUID"))
}

/// Checkout session id: ASCII 英數與 `_`
pub fn validate_session_id(session_id: &str) -> Result<()> {
    if session_id.is_empty() || session_id.len() > 255 {
        return Err(LensError::invalid_input(
            "session_id",
            "length must be between 1 and 255",
        ));
    }

    if !session_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(LensError::invalid_input(
            "session_id",
            "only ASCII letters, digits and '_' are allowed",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("server.public_base_url", "https://example.com").is_ok());
        assert!(validate_url("server.public_base_url", "http://example.com").is_ok());
        assert!(validate_url("server.public_base_url", "").is_err());
        assert!(validate_url("server.public_base_url", "invalid-url").is_err());
        assert!(validate_url("server.public_base_url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("payments.max_photos_per_order", 5, 1).is_ok());
        assert!(validate_positive_number("payments.max_photos_per_order", 0, 1).is_err());
    }

    #[test]
    fn test_validate_s3_bucket_name() {
        assert!(validate_s3_bucket_name("storage.bucket", "event-photos.prod").is_ok());
        assert!(validate_s3_bucket_name("storage.bucket", "ab").is_err());
        assert!(validate_s3_bucket_name("storage.bucket", "Event_Photos").is_err());
        assert!(validate_s3_bucket_name("storage.bucket", "-photos").is_err());
    }

    #[test]
    fn test_validate_no_placeholder() {
        assert!(validate_no_placeholder("payments.secret_key", "sk_test_123").is_ok());
        assert!(validate_no_placeholder("payments.secret_key", "${STRIPE_SECRET_KEY}").is_err());
    }

    #[test]
    fn test_parse_resource_id_normalizes() {
        let id = parse_resource_id("event_id", "67E5504410B1426F9247BB680E5FE0C8").unwrap();
        assert_eq!(id, "67e55044-10b1-426f-9247-bb680e5fe0c8");
        assert!(parse_resource_id("event_id", "../etc/passwd").is_err());
    }

    #[test]
    fn test_validate_session_id() {
        assert!(validate_session_id("cs_test_a1B2c3").is_ok());
        assert!(validate_session_id("").is_err());
        assert!(validate_session_id("cs/../../orders").is_err());
    }
}
