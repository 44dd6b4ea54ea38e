use crate::app::photos::check_upload_size;
use crate::app::{EventService, PhotoService, PublicLinks};
use crate::config::FaceConfig;
use crate::core::imaging::ImageProcessor;
use crate::domain::model::{FaceHit, PhotoMatch};
use crate::domain::ports::FaceIndex;
use crate::utils::error::{LensError, Result};
use std::collections::HashMap;
use std::sync::Arc;

pub struct SearchService {
    faces: Arc<dyn FaceIndex>,
    events: Arc<EventService>,
    photos: Arc<PhotoService>,
    processor: Arc<ImageProcessor>,
    match_threshold: f32,
    max_search_faces: u32,
    max_upload_bytes: usize,
    links: PublicLinks,
}

impl SearchService {
    pub fn new(
        faces: Arc<dyn FaceIndex>,
        events: Arc<EventService>,
        photos: Arc<PhotoService>,
        processor: Arc<ImageProcessor>,
        config: &FaceConfig,
        max_upload_bytes: usize,
        links: PublicLinks,
    ) -> Self {
        Self {
            faces,
            events,
            photos,
            processor,
            match_threshold: config.match_threshold,
            max_search_faces: config.max_search_faces,
            max_upload_bytes,
            links,
        }
    }

    /// 以自拍照找出活動中出現同一張臉的照片
    pub async fn find_photos(&self, event_id: &str, selfie: Vec<u8>) -> Result<Vec<PhotoMatch>> {
        let event = self.events.get_event(event_id).await?;
        check_upload_size(selfie.len(), self.max_upload_bytes)?;

        let processor = self.processor.clone();
        let jpeg = tokio::task::spawn_blocking(move || processor.prepare_selfie(&selfie)).await??;

        let hits = self
            .faces
            .search_faces(
                &event.collection_id,
                &jpeg,
                self.match_threshold,
                self.max_search_faces,
            )
            .await?;
        tracing::debug!("Face index returned {} hits for event {}", hits.len(), event.id);

        let mut matches = Vec::new();
        for (photo_id, similarity) in best_similarity_per_photo(&hits) {
            // 已刪除的照片可能仍留在索引中
            match self.photos.get(&event.id, &photo_id).await {
                Ok(record) => matches.push(PhotoMatch {
                    preview_url: self.links.preview(&event.id, &record.id),
                    photo_id: record.id,
                    similarity,
                }),
                Err(LensError::NotFound { .. }) | Err(LensError::InvalidInput { .. }) => {
                    tracing::debug!("Skipping stale face hit for photo {}", photo_id);
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!(
            "🔍 Selfie search in event {} matched {} photos",
            event.id,
            matches.len()
        );
        Ok(matches)
    }
}

/// 每張照片保留最高相似度，依相似度遞減、id 遞增排序
fn best_similarity_per_photo(hits: &[FaceHit]) -> Vec<(String, f32)> {
    let mut best: HashMap<&str, f32> = HashMap::new();
    for hit in hits {
        let entry = best.entry(hit.external_image_id.as_str()).or_insert(hit.similarity);
        if hit.similarity > *entry {
            *entry = hit.similarity;
        }
    }

    let mut ranked: Vec<(String, f32)> = best
        .into_iter()
        .map(|(photo_id, similarity)| (photo_id.to_string(), similarity))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(face_id: &str, photo_id: &str, similarity: f32) -> FaceHit {
        FaceHit {
            face_id: face_id.to_string(),
            external_image_id: photo_id.to_string(),
            similarity,
        }
    }

    #[test]
    fn test_best_similarity_per_photo_groups_and_ranks() {
        let hits = vec![
            hit("f1", "photo-b", 91.0),
            hit("f2", "photo-a", 95.5),
            hit("f3", "photo-b", 99.1),
            hit("f4", "photo-c", 95.5),
        ];

        let ranked = best_similarity_per_photo(&hits);
        assert_eq!(
            ranked,
            vec![
                ("photo-b".to_string(), 99.1),
                ("photo-a".to_string(), 95.5),
                ("photo-c".to_string(), 95.5),
            ]
        );
    }

    #[test]
    fn test_best_similarity_per_photo_empty() {
        assert!(best_similarity_per_photo(&[]).is_empty());
    }
}
