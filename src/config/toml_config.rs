use crate::utils::error::{LensError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// 單價上限 (最小貨幣單位)
pub const MAX_UNIT_AMOUNT: u64 = 99_999_999;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub faces: FaceConfig,
    pub images: ImageConfig,
    pub payments: PaymentConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// 產生預覽與下載連結用的對外網址
    pub public_base_url: String,
    pub max_upload_mb: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
            public_base_url: "http://localhost:8080".to_string(),
            max_upload_mb: 20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    S3,
    Local,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub bucket: String,
    pub region: String,
    /// S3 相容服務 (MinIO 等)
    pub endpoint_url: Option<String>,
    pub force_path_style: bool,
    pub local_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::S3,
            bucket: String::new(),
            region: "us-east-1".to_string(),
            endpoint_url: None,
            force_path_style: false,
            local_path: "./data".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceConfig {
    pub region: String,
    pub endpoint_url: Option<String>,
    pub collection_prefix: String,
    /// Minimum similarity (0-100) for a face to count as a match.
    pub match_threshold: f32,
    pub max_faces_per_photo: u32,
    pub max_search_faces: u32,
    /// NONE, AUTO, LOW, MEDIUM, HIGH
    pub quality_filter: String,
}

impl Default for FaceConfig {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            endpoint_url: None,
            collection_prefix: "event-lens".to_string(),
            match_threshold: 90.0,
            max_faces_per_photo: 15,
            max_search_faces: 100,
            quality_filter: "AUTO".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub preview_max_dimension: u32,
    pub index_max_dimension: u32,
    pub jpeg_quality: u8,
    pub watermark_path: Option<String>,
    pub watermark_opacity: f32,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            preview_max_dimension: 1200,
            index_max_dimension: 1920,
            jpeg_quality: 85,
            watermark_path: None,
            watermark_opacity: 0.35,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentConfig {
    pub api_base: String,
    pub secret_key: String,
    pub currency: String,
    /// Smallest currency unit (cents for usd).
    pub price_per_photo: u64,
    pub product_name: String,
    /// 未設定時由 public_base_url 推導
    pub success_url: Option<String>,
    pub cancel_url: Option<String>,
    pub max_photos_per_order: usize,
    pub timeout_seconds: u64,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.stripe.com".to_string(),
            secret_key: String::new(),
            currency: "usd".to_string(),
            price_per_photo: 500,
            product_name: "Event photo (full resolution)".to_string(),
            success_url: None,
            cancel_url: None,
            max_photos_per_order: 50,
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub verbose: bool,
    pub json: bool,
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(LensError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| LensError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 只用環境變數建立配置 (沒有設定檔時)
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(bind) = env::var("EVENT_LENS_BIND") {
            config.server.bind = bind;
        }
        if let Ok(url) = env::var("EVENT_LENS_PUBLIC_URL") {
            config.server.public_base_url = url;
        }
        if let Ok(bucket) = env::var("EVENT_LENS_BUCKET") {
            config.storage.bucket = bucket;
        }
        if let Ok(region) = env::var("EVENT_LENS_REGION") {
            config.storage.region = region.clone();
            config.faces.region = region;
        }
        if let Ok(backend) = env::var("EVENT_LENS_STORAGE") {
            config.storage.backend = match backend.to_ascii_lowercase().as_str() {
                "s3" => StorageBackend::S3,
                "local" => StorageBackend::Local,
                other => {
                    return Err(LensError::InvalidConfigValueError {
                        field: "EVENT_LENS_STORAGE".to_string(),
                        value: other.to_string(),
                        reason: "expected 's3' or 'local'".to_string(),
                    })
                }
            };
        }
        if let Ok(dir) = env::var("EVENT_LENS_DATA_DIR") {
            config.storage.local_path = dir;
        }
        config.payments.secret_key =
            env::var("STRIPE_SECRET_KEY").map_err(|_| LensError::MissingConfigError {
                field: "STRIPE_SECRET_KEY".to_string(),
            })?;

        Ok(config)
    }

    /// 替換環境變數 (例如 ${STRIPE_SECRET_KEY})，未定義者保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| LensError::ConfigError {
            message: format!("Invalid placeholder pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.server.max_upload_mb * 1024 * 1024
    }

    pub fn public_base_url(&self) -> &str {
        self.server.public_base_url.trim_end_matches('/')
    }

    /// 付款成功後導回的網址；`{CHECKOUT_SESSION_ID}` 由金流服務替換
    pub fn success_url(&self) -> String {
        self.payments.success_url.clone().unwrap_or_else(|| {
            format!("{}/checkout/{{CHECKOUT_SESSION_ID}}", self.public_base_url())
        })
    }

    pub fn cancel_url(&self) -> String {
        self.payments
            .cancel_url
            .clone()
            .unwrap_or_else(|| format!("{}/", self.public_base_url()))
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("server.bind", &self.server.bind)?;
        validation::validate_url("server.public_base_url", &self.server.public_base_url)?;
        validation::validate_range("server.max_upload_mb", self.server.max_upload_mb, 1, 200)?;

        match self.storage.backend {
            StorageBackend::S3 => {
                validation::validate_no_placeholder("storage.bucket", &self.storage.bucket)?;
                validation::validate_s3_bucket_name("storage.bucket", &self.storage.bucket)?;
                validation::validate_aws_region("storage.region", &self.storage.region)?;
                if let Some(endpoint) = &self.storage.endpoint_url {
                    validation::validate_url("storage.endpoint_url", endpoint)?;
                }
            }
            StorageBackend::Local => {
                validation::validate_path("storage.local_path", &self.storage.local_path)?;
            }
        }

        validation::validate_aws_region("faces.region", &self.faces.region)?;
        validation::validate_non_empty_string(
            "faces.collection_prefix",
            &self.faces.collection_prefix,
        )?;
        validation::validate_range("faces.match_threshold", self.faces.match_threshold, 0.0, 100.0)?;
        validation::validate_range("faces.max_faces_per_photo", self.faces.max_faces_per_photo, 1, 100)?;
        validation::validate_range("faces.max_search_faces", self.faces.max_search_faces, 1, 4096)?;
        let quality_filters = ["NONE", "AUTO", "LOW", "MEDIUM", "HIGH"];
        if !quality_filters.contains(&self.faces.quality_filter.as_str()) {
            return Err(LensError::InvalidConfigValueError {
                field: "faces.quality_filter".to_string(),
                value: self.faces.quality_filter.clone(),
                reason: format!("Valid filters: {}", quality_filters.join(", ")),
            });
        }

        validation::validate_range(
            "images.preview_max_dimension",
            self.images.preview_max_dimension,
            64,
            8192,
        )?;
        validation::validate_range(
            "images.index_max_dimension",
            self.images.index_max_dimension,
            80,
            4096,
        )?;
        validation::validate_range("images.jpeg_quality", self.images.jpeg_quality, 1, 100)?;
        validation::validate_range(
            "images.watermark_opacity",
            self.images.watermark_opacity,
            0.0,
            1.0,
        )?;
        if let Some(path) = &self.images.watermark_path {
            validation::validate_path("images.watermark_path", path)?;
        }

        validation::validate_url("payments.api_base", &self.payments.api_base)?;
        validation::validate_non_empty_string("payments.secret_key", &self.payments.secret_key)?;
        validation::validate_no_placeholder("payments.secret_key", &self.payments.secret_key)?;
        if self.payments.currency.len() != 3
            || !self.payments.currency.chars().all(|c| c.is_ascii_lowercase())
        {
            return Err(LensError::InvalidConfigValueError {
                field: "payments.currency".to_string(),
                value: self.payments.currency.clone(),
                reason: "Expected a lowercase ISO 4217 code".to_string(),
            });
        }
        // 金流單價上限為 8 位數
        validation::validate_range(
            "payments.price_per_photo",
            self.payments.price_per_photo,
            1,
            MAX_UNIT_AMOUNT,
        )?;
        validation::validate_range(
            "payments.max_photos_per_order",
            self.payments.max_photos_per_order,
            1,
            100,
        )?;
        validation::validate_positive_number(
            "payments.timeout_seconds",
            self.payments.timeout_seconds as usize,
            1,
        )?;
        if let Some(url) = &self.payments.success_url {
            validation::validate_url("payments.success_url", url)?;
        }
        if let Some(url) = &self.payments.cancel_url {
            validation::validate_url("payments.cancel_url", url)?;
        }

        tracing::debug!("✅ Configuration validation passed");
        Ok(())
    }
}
