use crate::domain::model::{
    CheckoutRequest, CheckoutSession, FaceHit, IndexedFace, StoredObject,
};
use crate::utils::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<()>;
    /// A missing key is `LensError::NotFound`.
    async fn get(&self, key: &str) -> Result<StoredObject>;
    /// Keys under `prefix`, sorted.
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;
    /// Deleting a missing key succeeds.
    async fn delete(&self, key: &str) -> Result<()>;
}

#[async_trait]
pub trait FaceIndex: Send + Sync {
    /// Creating a collection that already exists succeeds.
    async fn ensure_collection(&self, collection_id: &str) -> Result<()>;

    async fn index_faces(
        &self,
        collection_id: &str,
        external_image_id: &str,
        jpeg: &[u8],
    ) -> Result<Vec<IndexedFace>>;

    /// An image without a detectable face is `LensError::NoFaceDetected`.
    async fn search_faces(
        &self,
        collection_id: &str,
        jpeg: &[u8],
        threshold: f32,
        max_faces: u32,
    ) -> Result<Vec<FaceHit>>;

    async fn delete_faces(&self, collection_id: &str, face_ids: &[String]) -> Result<()>;
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_checkout(&self, request: &CheckoutRequest) -> Result<CheckoutSession>;
    async fn retrieve_checkout(&self, session_id: &str) -> Result<CheckoutSession>;
}
