pub mod toml_config;

pub use toml_config::{
    AppConfig, FaceConfig, ImageConfig, LoggingConfig, PaymentConfig, ServerConfig,
    StorageBackend, StorageConfig,
};

use crate::utils::error::Result;
use clap::Parser;
use std::path::Path;

#[derive(Debug, Clone, Parser)]
#[command(name = "event-lens")]
#[command(about = "Event photo face search and checkout backend")]
pub struct ServeArgs {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "event-lens.toml")]
    pub config: String,

    /// Override server.bind
    #[arg(long)]
    pub bind: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit JSON log lines
    #[arg(long)]
    pub json_logs: bool,
}

impl ServeArgs {
    /// 設定檔存在時讀檔，否則只用環境變數；命令列參數最後覆蓋
    pub fn load_config(&self) -> Result<AppConfig> {
        let mut config = if Path::new(&self.config).exists() {
            AppConfig::from_file(&self.config)?
        } else {
            AppConfig::from_env()?
        };

        if let Some(bind) = &self.bind {
            config.server.bind = bind.clone();
        }
        config.logging.verbose |= self.verbose;
        config.logging.json |= self.json_logs;

        Ok(config)
    }
}
