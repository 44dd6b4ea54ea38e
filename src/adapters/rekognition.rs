use crate::config::FaceConfig;
use crate::domain::model::{FaceBox, FaceHit, IndexedFace};
use crate::domain::ports::FaceIndex;
use crate::utils::error::{LensError, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_rekognition::config::Region;
use aws_sdk_rekognition::error::DisplayErrorContext;
use aws_sdk_rekognition::primitives::Blob;
use aws_sdk_rekognition::types::{BoundingBox, Image, QualityFilter};
use aws_sdk_rekognition::Client as RekognitionClient;

/// AWS Rekognition 人臉索引
#[derive(Debug, Clone)]
pub struct RekognitionFaceIndex {
    client: RekognitionClient,
    max_faces_per_photo: u32,
    quality_filter: QualityFilter,
}

impl RekognitionFaceIndex {
    pub fn new(client: RekognitionClient, config: &FaceConfig) -> Self {
        Self {
            client,
            max_faces_per_photo: config.max_faces_per_photo,
            quality_filter: QualityFilter::from(config.quality_filter.as_str()),
        }
    }

    pub async fn from_config(config: &FaceConfig) -> Self {
        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_rekognition::config::Builder::from(&shared);
        if let Some(endpoint) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }

        Self::new(RekognitionClient::from_conf(builder.build()), config)
    }
}

fn face_index_error<E: std::error::Error>(action: &str, err: E) -> LensError {
    LensError::FaceIndexError {
        message: format!("{} failed: {}", action, DisplayErrorContext(err)),
    }
}

fn image_from(jpeg: &[u8]) -> Image {
    Image::builder().bytes(Blob::new(jpeg.to_vec())).build()
}

fn face_box(bounding_box: &BoundingBox) -> Option<FaceBox> {
    Some(FaceBox {
        left: bounding_box.left()?,
        top: bounding_box.top()?,
        width: bounding_box.width()?,
        height: bounding_box.height()?,
    })
}

#[async_trait]
impl FaceIndex for RekognitionFaceIndex {
    async fn ensure_collection(&self, collection_id: &str) -> Result<()> {
        match self
            .client
            .create_collection()
            .collection_id(collection_id)
            .send()
            .await
        {
            Ok(output) => {
                tracing::info!(
                    "📚 Created face collection {} (status {:?})",
                    collection_id,
                    output.status_code()
                );
                Ok(())
            }
            Err(e)
                if e.as_service_error()
                    .map(|se| se.is_resource_already_exists_exception())
                    .unwrap_or(false) =>
            {
                tracing::debug!("Face collection {} already exists", collection_id);
                Ok(())
            }
            Err(e) => Err(face_index_error("CreateCollection", e)),
        }
    }

    async fn index_faces(
        &self,
        collection_id: &str,
        external_image_id: &str,
        jpeg: &[u8],
    ) -> Result<Vec<IndexedFace>> {
        let output = self
            .client
            .index_faces()
            .collection_id(collection_id)
            .external_image_id(external_image_id)
            .image(image_from(jpeg))
            .max_faces(self.max_faces_per_photo as i32)
            .quality_filter(self.quality_filter.clone())
            .send()
            .await
            .map_err(|e| face_index_error("IndexFaces", e))?;

        if !output.unindexed_faces().is_empty() {
            tracing::debug!(
                "{} faces in {} were filtered out by quality checks",
                output.unindexed_faces().len(),
                external_image_id
            );
        }

        let faces = output
            .face_records()
            .iter()
            .filter_map(|record| record.face())
            .filter_map(|face| {
                Some(IndexedFace {
                    face_id: face.face_id()?.to_string(),
                    confidence: face.confidence().unwrap_or_default(),
                    bounding_box: face.bounding_box().and_then(face_box),
                })
            })
            .collect();

        Ok(faces)
    }

    async fn search_faces(
        &self,
        collection_id: &str,
        jpeg: &[u8],
        threshold: f32,
        max_faces: u32,
    ) -> Result<Vec<FaceHit>> {
        let output = self
            .client
            .search_faces_by_image()
            .collection_id(collection_id)
            .image(image_from(jpeg))
            .face_match_threshold(threshold)
            .max_faces(max_faces as i32)
            .send()
            .await
            .map_err(|e| {
                // 圖片中找不到人臉時 Rekognition 回 InvalidParameterException
                if e.as_service_error()
                    .map(|se| se.is_invalid_parameter_exception())
                    .unwrap_or(false)
                {
                    LensError::NoFaceDetected
                } else {
                    face_index_error("SearchFacesByImage", e)
                }
            })?;

        let hits = output
            .face_matches()
            .iter()
            .filter_map(|face_match| {
                let face = face_match.face()?;
                Some(FaceHit {
                    face_id: face.face_id()?.to_string(),
                    external_image_id: face.external_image_id()?.to_string(),
                    similarity: face_match.similarity().unwrap_or_default(),
                })
            })
            .collect();

        Ok(hits)
    }

    async fn delete_faces(&self, collection_id: &str, face_ids: &[String]) -> Result<()> {
        if face_ids.is_empty() {
            return Ok(());
        }

        self.client
            .delete_faces()
            .collection_id(collection_id)
            .set_face_ids(Some(face_ids.to_vec()))
            .send()
            .await
            .map_err(|e| face_index_error("DeleteFaces", e))?;

        Ok(())
    }
}
