use anyhow::Context;
use clap::Parser;
use event_lens::adapters::{LocalStorage, RekognitionFaceIndex, S3Storage, StripeCheckout};
use event_lens::config::StorageBackend;
use event_lens::domain::ports::{FaceIndex, ObjectStore, PaymentGateway};
use event_lens::utils::{logger, validation::Validate};
use event_lens::{ServeArgs, Services};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ServeArgs::parse();

    let config = match args.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load configuration from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    // 初始化日誌
    logger::init_logger(config.logging.verbose, config.logging.json);
    tracing::info!("Starting event-lens v{}", env!("CARGO_PKG_VERSION"));

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    let store: Arc<dyn ObjectStore> = match config.storage.backend {
        StorageBackend::S3 => {
            tracing::info!("🪣 Using S3 bucket {}", config.storage.bucket);
            Arc::new(S3Storage::from_config(&config.storage).await)
        }
        StorageBackend::Local => {
            tracing::info!("📁 Using local storage at {}", config.storage.local_path);
            Arc::new(LocalStorage::new(config.storage.local_path.clone()))
        }
    };
    let faces: Arc<dyn FaceIndex> = Arc::new(RekognitionFaceIndex::from_config(&config.faces).await);
    let payments: Arc<dyn PaymentGateway> =
        Arc::new(StripeCheckout::new(&config.payments).context("creating payment client")?);

    let services =
        Services::new(&config, store, faces, payments).context("building application services")?;

    event_lens::serve(&config, services)
        .await
        .context("running http server")?;

    Ok(())
}
