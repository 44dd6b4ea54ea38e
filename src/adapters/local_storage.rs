use crate::domain::keys::content_type_for_key;
use crate::domain::model::StoredObject;
use crate::domain::ports::ObjectStore;
use crate::utils::error::{LensError, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// 本機目錄儲存，開發與離線使用
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn resolve(&self, key: &str) -> Result<PathBuf> {
        if key.starts_with('/') || key.contains('\\') || key.contains('\0') {
            return Err(LensError::invalid_input("object key", key));
        }

        let mut path = self.base_path.clone();
        for segment in key.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." {
                return Err(LensError::invalid_input("object key", key));
            }
            path.push(segment);
        }
        Ok(path)
    }

    fn key_for(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.base_path).ok()?;
        let segments: Vec<&str> = relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<Vec<_>>>()?;
        Some(segments.join("/"))
    }
}

#[async_trait]
impl ObjectStore for LocalStorage {
    async fn put(&self, key: &str, bytes: Vec<u8>, _content_type: &str) -> Result<()> {
        let full_path = self.resolve(key)?;

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&full_path, bytes).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<StoredObject> {
        let full_path = self.resolve(key)?;

        match tokio::fs::read(&full_path).await {
            Ok(bytes) => Ok(StoredObject {
                bytes,
                content_type: content_type_for_key(key).to_string(),
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(LensError::not_found(key)),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        // 從 prefix 最後一個 '/' 之前的目錄開始走訪
        let start = match prefix.rsplit_once('/') {
            Some((dir, _)) if !dir.is_empty() => self.resolve(dir)?,
            _ => self.base_path.clone(),
        };

        let mut keys = Vec::new();
        let mut pending = vec![start];
        while let Some(dir) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };

            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    pending.push(path);
                } else if let Some(key) = self.key_for(&path) {
                    if key.starts_with(prefix) {
                        keys.push(key);
                    }
                }
            }
        }

        keys.sort();
        Ok(keys)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let full_path = self.resolve(key)?;
        match tokio::fs::remove_file(&full_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_put_get_roundtrip_with_content_type() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());

        storage
            .put("events/e1/previews/p1.jpg", vec![1, 2, 3], "image/jpeg")
            .await
            .unwrap();

        let object = storage.get("events/e1/previews/p1.jpg").await.unwrap();
        assert_eq!(object.bytes, vec![1, 2, 3]);
        assert_eq!(object.content_type, "image/jpeg");
    }

    #[tokio::test]
    async fn test_missing_key_is_not_found() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());

        let err = storage.get("orders/missing.json").await.unwrap_err();
        assert!(matches!(err, LensError::NotFound { .. }));
        assert!(storage.delete("orders/missing.json").await.is_ok());
    }

    #[tokio::test]
    async fn test_rejects_traversal_keys() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());

        for key in ["../escape.json", "/etc/passwd", "events//x.json", "a/./b"] {
            let err = storage.put(key, vec![0], "application/json").await.unwrap_err();
            assert!(matches!(err, LensError::InvalidInput { .. }), "{}", key);
        }
    }

    #[tokio::test]
    async fn test_list_filters_by_prefix_and_sorts() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());

        for key in [
            "events/e1/photos/b.json",
            "events/e1/photos/a.json",
            "events/e1/previews/a.jpg",
            "events/e2/photos/c.json",
        ] {
            storage.put(key, vec![0], "application/json").await.unwrap();
        }

        let keys = storage.list("events/e1/photos/").await.unwrap();
        assert_eq!(
            keys,
            vec!["events/e1/photos/a.json", "events/e1/photos/b.json"]
        );

        assert!(storage.list("events/e9/photos/").await.unwrap().is_empty());
        assert_eq!(storage.list("events/").await.unwrap().len(), 4);
    }
}
