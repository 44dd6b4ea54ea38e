#![allow(dead_code)]

use async_trait::async_trait;
use event_lens::app::Services;
use event_lens::config::AppConfig;
use event_lens::domain::model::{FaceBox, FaceHit, IndexedFace, StoredObject};
use event_lens::domain::ports::{FaceIndex, ObjectStore, PaymentGateway};
use event_lens::adapters::StripeCheckout;
use event_lens::{LensError, Result};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::collections::{BTreeMap, HashMap};
use std::io::Cursor;
use std::sync::{Arc, Mutex};

pub const SECRET_KEY: &str = "sk_test_event_lens";
pub const PUBLIC_BASE_URL: &str = "http://photos.test";

pub const RED: [u8; 3] = [220, 30, 30];
pub const BLUE: [u8; 3] = [30, 40, 210];
/// 太暗的圖片在假索引中視為沒有人臉
pub const DARK: [u8; 3] = [5, 5, 5];

#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<String, StoredObject>>,
}

impl MemoryStore {
    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<StoredObject> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| LensError::not_found(key))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct FakeFace {
    face_id: String,
    external_image_id: String,
    color: [f32; 3],
}

/// 以圖片平均顏色當作「人臉」：顏色相近即視為同一人
#[derive(Default)]
pub struct FakeFaceIndex {
    collections: Mutex<HashMap<String, Vec<FakeFace>>>,
    next_face: Mutex<u64>,
}

impl FakeFaceIndex {
    pub fn collection_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.collections.lock().unwrap().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn face_count(&self, collection_id: &str) -> usize {
        self.collections
            .lock()
            .unwrap()
            .get(collection_id)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

fn average_color(jpeg: &[u8]) -> Result<[f32; 3]> {
    let image = image::load_from_memory(jpeg)?.to_rgb8();
    let count = (image.width() * image.height()).max(1) as f32;
    let mut sum = [0f32; 3];
    for pixel in image.pixels() {
        for channel in 0..3 {
            sum[channel] += pixel.0[channel] as f32;
        }
    }
    Ok([sum[0] / count, sum[1] / count, sum[2] / count])
}

fn is_dark(color: &[f32; 3]) -> bool {
    color.iter().all(|channel| *channel < 40.0)
}

fn missing_collection(collection_id: &str) -> LensError {
    LensError::FaceIndexError {
        message: format!("collection {} does not exist", collection_id),
    }
}

#[async_trait]
impl FaceIndex for FakeFaceIndex {
    async fn ensure_collection(&self, collection_id: &str) -> Result<()> {
        self.collections
            .lock()
            .unwrap()
            .entry(collection_id.to_string())
            .or_default();
        Ok(())
    }

    async fn index_faces(
        &self,
        collection_id: &str,
        external_image_id: &str,
        jpeg: &[u8],
    ) -> Result<Vec<IndexedFace>> {
        let color = average_color(jpeg)?;
        let mut collections = self.collections.lock().unwrap();
        let faces = collections
            .get_mut(collection_id)
            .ok_or_else(|| missing_collection(collection_id))?;

        if is_dark(&color) {
            return Ok(Vec::new());
        }

        let mut next = self.next_face.lock().unwrap();
        *next += 1;
        let face_id = format!("face-{}", *next);
        faces.push(FakeFace {
            face_id: face_id.clone(),
            external_image_id: external_image_id.to_string(),
            color,
        });

        Ok(vec![IndexedFace {
            face_id,
            confidence: 99.9,
            bounding_box: Some(FaceBox {
                left: 0.25,
                top: 0.25,
                width: 0.5,
                height: 0.5,
            }),
        }])
    }

    async fn search_faces(
        &self,
        collection_id: &str,
        jpeg: &[u8],
        threshold: f32,
        max_faces: u32,
    ) -> Result<Vec<FaceHit>> {
        let color = average_color(jpeg)?;
        if is_dark(&color) {
            return Err(LensError::NoFaceDetected);
        }

        let collections = self.collections.lock().unwrap();
        let faces = collections
            .get(collection_id)
            .ok_or_else(|| missing_collection(collection_id))?;

        let mut hits: Vec<FaceHit> = faces
            .iter()
            .filter_map(|face| {
                let distance = (0..3)
                    .map(|c| (face.color[c] - color[c]).abs())
                    .fold(0f32, f32::max);
                let similarity = (100.0 - distance).max(0.0);
                (similarity >= threshold).then(|| FaceHit {
                    face_id: face.face_id.clone(),
                    external_image_id: face.external_image_id.clone(),
                    similarity,
                })
            })
            .collect();
        hits.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        hits.truncate(max_faces as usize);
        Ok(hits)
    }

    async fn delete_faces(&self, collection_id: &str, face_ids: &[String]) -> Result<()> {
        let mut collections = self.collections.lock().unwrap();
        let faces = collections
            .get_mut(collection_id)
            .ok_or_else(|| missing_collection(collection_id))?;
        faces.retain(|face| !face_ids.contains(&face.face_id));
        Ok(())
    }
}

pub fn solid_image(width: u32, height: u32, color: [u8; 3], format: ImageFormat) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb(color));
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut buffer, format)
        .unwrap();
    buffer.into_inner()
}

pub fn solid_jpeg(color: [u8; 3]) -> Vec<u8> {
    solid_image(64, 48, color, ImageFormat::Jpeg)
}

pub fn test_config(payment_api_base: &str) -> AppConfig {
    let mut config = AppConfig::default();
    config.server.bind = "127.0.0.1:0".to_string();
    config.server.public_base_url = PUBLIC_BASE_URL.to_string();
    config.server.max_upload_mb = 1;
    config.faces.collection_prefix = "test".to_string();
    config.images.preview_max_dimension = 32;
    config.images.index_max_dimension = 48;
    config.payments.api_base = payment_api_base.to_string();
    config.payments.secret_key = SECRET_KEY.to_string();
    config.payments.price_per_photo = 500;
    config.payments.max_photos_per_order = 3;
    config.payments.timeout_seconds = 5;
    config
}

pub struct TestApp {
    pub config: AppConfig,
    pub services: Services,
    pub store: Arc<MemoryStore>,
    pub faces: Arc<FakeFaceIndex>,
}

/// 記憶體儲存 + 假人臉索引 + 指向 mock server 的 Stripe client
pub fn test_app(payment_api_base: &str) -> TestApp {
    let config = test_config(payment_api_base);
    let store = Arc::new(MemoryStore::default());
    let faces = Arc::new(FakeFaceIndex::default());
    let payments: Arc<dyn PaymentGateway> =
        Arc::new(StripeCheckout::new(&config.payments).unwrap());

    let services = Services::new(&config, store.clone(), faces.clone(), payments).unwrap();
    TestApp {
        config,
        services,
        store,
        faces,
    }
}
