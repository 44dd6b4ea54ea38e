use crate::config::StorageConfig;
use crate::domain::keys::content_type_for_key;
use crate::domain::model::StoredObject;
use crate::domain::ports::ObjectStore;
use crate::utils::error::{LensError, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;

#[derive(Debug, Clone)]
pub struct S3Storage {
    client: S3Client,
    bucket: String,
}

impl S3Storage {
    pub fn new(client: S3Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    /// 依設定建立 S3 client (可指向 S3 相容服務)
    pub async fn from_config(config: &StorageConfig) -> Self {
        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(config.force_path_style);
        if let Some(endpoint) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }

        Self::new(S3Client::from_conf(builder.build()), config.bucket.clone())
    }
}

fn storage_error<E: std::error::Error>(action: &str, key: &str, err: E) -> LensError {
    LensError::StorageError {
        message: format!(
            "Failed to {} s3 object {}: {}",
            action,
            key,
            DisplayErrorContext(err)
        ),
    }
}

#[async_trait]
impl ObjectStore for S3Storage {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        tracing::debug!("Writing {} bytes to s3://{}/{}", bytes.len(), self.bucket, key);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| storage_error("write", key, e))?;

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<StoredObject> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().map(|se| se.is_no_such_key()).unwrap_or(false) {
                    LensError::not_found(key)
                } else {
                    storage_error("read", key, e)
                }
            })?;

        let content_type = resp
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| content_type_for_key(key).to_string());

        let data = resp
            .body
            .collect()
            .await
            .map_err(|e| storage_error("collect", key, e))?;

        Ok(StoredObject {
            bytes: data.into_bytes().to_vec(),
            content_type,
        })
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let resp = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .set_continuation_token(continuation_token.take())
                .send()
                .await
                .map_err(|e| storage_error("list", prefix, e))?;

            keys.extend(
                resp.contents()
                    .iter()
                    .filter_map(|object| object.key().map(str::to_string)),
            );

            match resp.next_continuation_token() {
                Some(token) if resp.is_truncated().unwrap_or(false) => {
                    continuation_token = Some(token.to_string());
                }
                _ => break,
            }
        }

        keys.sort();
        Ok(keys)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        // S3 的 DeleteObject 對不存在的 key 也回傳成功
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| storage_error("delete", key, e))?;

        Ok(())
    }
}
