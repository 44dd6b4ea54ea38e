use thiserror::Error;

#[derive(Error, Debug)]
pub enum LensError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("HTTP request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Background task failed: {0}")]
    TaskError(#[from] tokio::task::JoinError),

    #[error("Resize error: {message}")]
    ResizeError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("{resource} not found")]
    NotFound { resource: String },

    #[error("Invalid {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Unsupported media type: {detected}")]
    UnsupportedMedia { detected: String },

    #[error("Payload of {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("No face detected in the submitted image")]
    NoFaceDetected,

    #[error("Checkout session {session_id} has not been paid")]
    PaymentRequired { session_id: String },

    #[error("Object storage error: {message}")]
    StorageError { message: String },

    #[error("Face index error: {message}")]
    FaceIndexError { message: String },

    #[error("Payment provider error: {message}")]
    PaymentError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// 呼叫端的請求有誤
    Client,
    /// 外部服務 (儲存、人臉辨識、金流) 失敗
    Upstream,
    Internal,
}

impl LensError {
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            LensError::NotFound { .. }
            | LensError::InvalidInput { .. }
            | LensError::UnsupportedMedia { .. }
            | LensError::PayloadTooLarge { .. }
            | LensError::NoFaceDetected
            | LensError::PaymentRequired { .. }
            | LensError::ImageError(
                image::ImageError::Decoding(_)
                | image::ImageError::Unsupported(_)
                | image::ImageError::Limits(_),
            ) => ErrorCategory::Client,
            LensError::ApiError(_)
            | LensError::StorageError { .. }
            | LensError::FaceIndexError { .. }
            | LensError::PaymentError { .. } => ErrorCategory::Upstream,
            _ => ErrorCategory::Internal,
        }
    }

    /// HTTP 狀態碼對應
    pub fn status_code(&self) -> u16 {
        match self {
            LensError::NotFound { .. } => 404,
            LensError::InvalidInput { .. } => 400,
            // 格式可辨識但內容毀損或不支援
            LensError::ImageError(image::ImageError::Decoding(_))
            | LensError::ImageError(image::ImageError::Unsupported(_)) => 400,
            // 宣告尺寸超過解碼上限
            LensError::ImageError(image::ImageError::Limits(_)) => 413,
            LensError::NoFaceDetected => 422,
            LensError::UnsupportedMedia { .. } => 415,
            LensError::PayloadTooLarge { .. } => 413,
            LensError::PaymentRequired { .. } => 402,
            LensError::ApiError(_)
            | LensError::StorageError { .. }
            | LensError::FaceIndexError { .. }
            | LensError::PaymentError { .. } => 502,
            _ => 500,
        }
    }

    /// 對外顯示的訊息，不洩漏上游或內部細節
    pub fn public_message(&self) -> String {
        match self.category() {
            ErrorCategory::Client => self.to_string(),
            ErrorCategory::Upstream => "upstream service failure".to_string(),
            ErrorCategory::Internal => "internal error".to_string(),
        }
    }
}

impl From<fast_image_resize::ResizeError> for LensError {
    fn from(e: fast_image_resize::ResizeError) -> Self {
        LensError::ResizeError {
            message: e.to_string(),
        }
    }
}

impl From<fast_image_resize::ImageBufferError> for LensError {
    fn from(e: fast_image_resize::ImageBufferError) -> Self {
        LensError::ResizeError {
            message: e.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LensError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_keep_their_message() {
        let err = LensError::not_found("photo 42");
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.category(), ErrorCategory::Client);
        assert_eq!(err.public_message(), "photo 42 not found");
    }

    #[test]
    fn test_upstream_errors_are_masked() {
        let err = LensError::FaceIndexError {
            message: "AccessDeniedException: no creds".to_string(),
        };
        assert_eq!(err.status_code(), 502);
        assert_eq!(err.public_message(), "upstream service failure");
    }

    #[test]
    fn test_internal_errors_are_masked() {
        let err = LensError::ConfigError {
            message: "secret".to_string(),
        };
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.public_message(), "internal error");
    }

    #[test]
    fn test_payment_required_maps_to_402() {
        let err = LensError::PaymentRequired {
            session_id: "cs_test_1".to_string(),
        };
        assert_eq!(err.status_code(), 402);
        assert_eq!(err.category(), ErrorCategory::Client);
    }

    #[test]
    fn test_image_limit_errors_are_client_errors() {
        let err = LensError::from(image::ImageError::Limits(
            image::error::LimitError::from_kind(image::error::LimitErrorKind::DimensionError),
        ));
        assert_eq!(err.status_code(), 413);
        assert_eq!(err.category(), ErrorCategory::Client);

        let err = LensError::from(image::ImageError::Unsupported(
            image::error::UnsupportedError::from_format_and_kind(
                image::error::ImageFormatHint::Exact(image::ImageFormat::WebP),
                image::error::UnsupportedErrorKind::GenericFeature("animation".to_string()),
            ),
        ));
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.category(), ErrorCategory::Client);
    }
}
