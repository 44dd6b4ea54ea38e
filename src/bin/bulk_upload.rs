use anyhow::{bail, Context};
use clap::Parser;
use event_lens::adapters::{LocalStorage, RekognitionFaceIndex, S3Storage, StripeCheckout};
use event_lens::config::{AppConfig, StorageBackend};
use event_lens::domain::ports::{FaceIndex, ObjectStore, PaymentGateway};
use event_lens::utils::{logger, validation::Validate};
use event_lens::Services;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

const PHOTO_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

#[derive(Debug, Parser)]
#[command(name = "bulk-upload")]
#[command(about = "Upload a directory of event photos and index their faces")]
struct BulkUploadArgs {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "event-lens.toml")]
    config: String,

    /// Directory containing the photos
    #[arg(short, long)]
    dir: PathBuf,

    /// Upload into an existing event
    #[arg(long, conflicts_with = "event_name")]
    event_id: Option<String>,

    /// Create a new event with this name
    #[arg(long)]
    event_name: Option<String>,

    /// Only list the files that would be uploaded
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// 目錄中可上傳的照片，依檔名排序
fn collect_photos(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let is_photo = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| PHOTO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if is_photo {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

async fn build_services(config: &AppConfig) -> anyhow::Result<Services> {
    let store: Arc<dyn ObjectStore> = match config.storage.backend {
        StorageBackend::S3 => Arc::new(S3Storage::from_config(&config.storage).await),
        StorageBackend::Local => Arc::new(LocalStorage::new(config.storage.local_path.clone())),
    };
    let faces: Arc<dyn FaceIndex> = Arc::new(RekognitionFaceIndex::from_config(&config.faces).await);
    let payments: Arc<dyn PaymentGateway> = Arc::new(StripeCheckout::new(&config.payments)?);
    Ok(Services::new(config, store, faces, payments)?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = BulkUploadArgs::parse();
    logger::init_cli_logger(args.verbose);

    let files = collect_photos(&args.dir)?;
    if files.is_empty() {
        bail!("no photos ({}) found in {}", PHOTO_EXTENSIONS.join(", "), args.dir.display());
    }
    tracing::info!("Found {} photos in {}", files.len(), args.dir.display());

    if args.dry_run {
        for file in &files {
            println!("{}", file.display());
        }
        println!("🔍 Dry run: {} photos would be uploaded", files.len());
        return Ok(());
    }

    let config = if Path::new(&args.config).exists() {
        AppConfig::from_file(&args.config)?
    } else {
        AppConfig::from_env()?
    };
    config.validate().context("validating configuration")?;

    let services = build_services(&config).await?;

    let event = match (&args.event_id, &args.event_name) {
        (Some(id), _) => services.events.get_event(id).await?,
        (None, Some(name)) => services.events.create_event(name).await?,
        (None, None) => bail!("either --event-id or --event-name is required"),
    };
    tracing::info!("📅 Uploading into event {} ({})", event.name, event.id);

    let started = Instant::now();
    let mut uploaded = 0usize;
    let mut failed = 0usize;
    let mut faces = 0usize;

    for file in &files {
        let filename = file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let bytes = tokio::fs::read(file)
            .await
            .with_context(|| format!("reading {}", file.display()))?;

        // 單張失敗不中止整批
        match services.photos.upload(&event.id, &filename, bytes).await {
            Ok(photo) => {
                uploaded += 1;
                faces += photo.faces_indexed;
                println!("✅ {} → {} ({} faces)", filename, photo.photo_id, photo.faces_indexed);
            }
            Err(e) => {
                failed += 1;
                tracing::warn!("⚠️ Skipping {}: {}", filename, e);
                eprintln!("❌ {}: {}", filename, e);
            }
        }
    }

    println!(
        "📦 Uploaded {}/{} photos ({} faces) into event {} in {:?}",
        uploaded,
        files.len(),
        faces,
        event.id,
        started.elapsed()
    );

    if failed > 0 {
        std::process::exit(2);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_photos_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.JPG", "a.png", "notes.txt", "c.webp", "raw.cr2"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.jpg")).unwrap();

        let names: Vec<String> = collect_photos(dir.path())
            .unwrap()
            .iter()
            .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.png", "b.JPG", "c.webp"]);
    }
}
