use crate::app::{read_json, write_json, EventService, PublicLinks};
use crate::core::imaging::ImageProcessor;
use crate::domain::keys;
use crate::domain::model::{PhotoRecord, StoredObject};
use crate::domain::ports::{FaceIndex, ObjectStore};
use crate::utils::error::{LensError, Result};
use crate::utils::validation::parse_resource_id;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

const MAX_FILENAME_CHARS: usize = 200;
/// 單次 multipart 上傳最多的檔案數
pub const MAX_FILES_PER_UPLOAD: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadedPhoto {
    pub photo_id: String,
    pub original_filename: String,
    pub faces_indexed: usize,
    pub preview_url: String,
}

#[derive(Serialize)]
struct ReportRow<'a> {
    photo_id: &'a str,
    original_filename: &'a str,
    content_type: &'a str,
    width: u32,
    height: u32,
    faces: usize,
    uploaded_at: String,
}

pub struct PhotoService {
    store: Arc<dyn ObjectStore>,
    faces: Arc<dyn FaceIndex>,
    events: Arc<EventService>,
    processor: Arc<ImageProcessor>,
    max_upload_bytes: usize,
    links: PublicLinks,
}

impl PhotoService {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        faces: Arc<dyn FaceIndex>,
        events: Arc<EventService>,
        processor: Arc<ImageProcessor>,
        max_upload_bytes: usize,
        links: PublicLinks,
    ) -> Self {
        Self {
            store,
            faces,
            events,
            processor,
            max_upload_bytes,
            links,
        }
    }

    /// 上傳流程：處理圖片 → 存原圖與預覽 → 建立人臉索引 → 存紀錄
    pub async fn upload(&self, event_id: &str, filename: &str, bytes: Vec<u8>) -> Result<UploadedPhoto> {
        let event = self.events.get_event(event_id).await?;
        check_upload_size(bytes.len(), self.max_upload_bytes)?;

        let started = Instant::now();
        let processor = self.processor.clone();
        let (processed, bytes) = tokio::task::spawn_blocking(move || {
            processor.process_upload(&bytes).map(|processed| (processed, bytes))
        })
        .await??;

        let photo_id = Uuid::new_v4().to_string();
        let original_filename = sanitize_filename(filename, processed.media_type.extension());
        let original_key =
            keys::original_key(&event.id, &photo_id, processed.media_type.extension());
        let preview_key = keys::preview_key(&event.id, &photo_id);

        self.store
            .put(&original_key, bytes, processed.media_type.content_type())
            .await?;
        self.store
            .put(&preview_key, processed.preview_jpeg, "image/jpeg")
            .await?;

        let indexed = self
            .faces
            .index_faces(&event.collection_id, &photo_id, &processed.index_jpeg)
            .await?;

        let record = PhotoRecord {
            id: photo_id.clone(),
            event_id: event.id.clone(),
            original_filename: original_filename.clone(),
            content_type: processed.media_type.content_type().to_string(),
            original_key,
            preview_key,
            width: processed.width,
            height: processed.height,
            face_ids: indexed.iter().map(|face| face.face_id.clone()).collect(),
            uploaded_at: Utc::now(),
        };
        write_json(
            self.store.as_ref(),
            &keys::photo_record_key(&event.id, &photo_id),
            &record,
        )
        .await?;

        tracing::info!(
            "📸 Stored photo {} in event {} with {} faces ({:?})",
            photo_id,
            event.id,
            indexed.len(),
            started.elapsed()
        );

        Ok(UploadedPhoto {
            preview_url: self.links.preview(&event.id, &photo_id),
            photo_id,
            original_filename,
            faces_indexed: indexed.len(),
        })
    }

    /// 依序上傳；第一個失敗即中止，已存入的照片保留
    pub async fn upload_many(
        &self,
        event_id: &str,
        files: Vec<(String, Vec<u8>)>,
    ) -> Result<Vec<UploadedPhoto>> {
        if files.is_empty() {
            return Err(LensError::invalid_input("photos", "no files were submitted"));
        }
        if files.len() > MAX_FILES_PER_UPLOAD {
            return Err(LensError::invalid_input(
                "photos",
                format!(
                    "{} files submitted, at most {} per upload",
                    files.len(),
                    MAX_FILES_PER_UPLOAD
                ),
            ));
        }

        let mut uploaded = Vec::with_capacity(files.len());
        for (filename, bytes) in files {
            uploaded.push(self.upload(event_id, &filename, bytes).await?);
        }
        Ok(uploaded)
    }

    pub async fn list(&self, event_id: &str) -> Result<Vec<PhotoRecord>> {
        let event = self.events.get_event(event_id).await?;
        let keys = self
            .store
            .list(&keys::photo_record_prefix(&event.id))
            .await?;

        let mut records = Vec::with_capacity(keys.len());
        for key in keys.iter().filter(|key| key.ends_with(".json")) {
            records.push(read_json::<PhotoRecord>(self.store.as_ref(), key).await?);
        }

        records.sort_by(|a, b| {
            a.uploaded_at
                .cmp(&b.uploaded_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(records)
    }

    pub async fn get(&self, event_id: &str, photo_id: &str) -> Result<PhotoRecord> {
        let event_id = parse_resource_id("event_id", event_id)?;
        let photo_id = parse_resource_id("photo_id", photo_id)?;

        read_json(
            self.store.as_ref(),
            &keys::photo_record_key(&event_id, &photo_id),
        )
        .await
        .map_err(|e| match e {
            LensError::NotFound { .. } => LensError::not_found(format!("photo {}", photo_id)),
            other => other,
        })
    }

    pub async fn preview(&self, event_id: &str, photo_id: &str) -> Result<StoredObject> {
        let record = self.get(event_id, photo_id).await?;
        self.store.get(&record.preview_key).await
    }

    pub async fn original(&self, record: &PhotoRecord) -> Result<StoredObject> {
        let mut object = self.store.get(&record.original_key).await?;
        object.content_type = record.content_type.clone();
        Ok(object)
    }

    pub async fn delete(&self, event_id: &str, photo_id: &str) -> Result<()> {
        let event = self.events.get_event(event_id).await?;
        let record = self.get(&event.id, photo_id).await?;

        self.faces
            .delete_faces(&event.collection_id, &record.face_ids)
            .await?;
        self.store.delete(&record.preview_key).await?;
        self.store.delete(&record.original_key).await?;
        self.store
            .delete(&keys::photo_record_key(&event.id, &record.id))
            .await?;

        tracing::info!("🗑️ Deleted photo {} from event {}", record.id, event.id);
        Ok(())
    }

    /// 攝影師用的照片清單 CSV
    pub async fn report_csv(&self, event_id: &str) -> Result<Vec<u8>> {
        let records = self.list(event_id).await?;

        let mut writer = csv::Writer::from_writer(Vec::new());
        for record in &records {
            writer.serialize(ReportRow {
                photo_id: &record.id,
                original_filename: &record.original_filename,
                content_type: &record.content_type,
                width: record.width,
                height: record.height,
                faces: record.face_ids.len(),
                uploaded_at: record.uploaded_at.to_rfc3339(),
            })?;
        }
        if records.is_empty() {
            writer.write_record([
                "photo_id",
                "original_filename",
                "content_type",
                "width",
                "height",
                "faces",
                "uploaded_at",
            ])?;
        }

        Ok(writer.into_inner().map_err(|e| e.into_error())?)
    }
}

pub(crate) fn check_upload_size(size: usize, limit: usize) -> Result<()> {
    if size == 0 {
        return Err(LensError::invalid_input("photo", "file is empty"));
    }
    if size > limit {
        return Err(LensError::PayloadTooLarge { size, limit });
    }
    Ok(())
}

/// 只保留檔名本身，去除路徑與控制字元
pub fn sanitize_filename(raw: &str, fallback_extension: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_control() && *c != '"')
        .take(MAX_FILENAME_CHARS)
        .collect();
    let cleaned = cleaned.trim().trim_start_matches('.').to_string();

    if cleaned.is_empty() {
        format!("photo.{}", fallback_extension)
    } else {
        cleaned
    }
}
