use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use dashmap::DashMap;

/// Raw byte storage port (object store in production).
///
/// The pipeline only needs plain get/put; presigning, retention and deletes
/// live with the owning service.
#[async_trait]
pub trait StorageService: Send + Sync {
    async fn get_bytes(&self, object_key: &str) -> AppResult<Vec<u8>>;

    async fn put(&self, object_key: &str, bytes: Vec<u8>, content_type: &str) -> AppResult<()>;
}

/// In-memory storage, for local runs and tests.
#[derive(Default)]
pub struct MemoryStorageService {
    objects: DashMap<String, (Vec<u8>, String)>,
}

impl MemoryStorageService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content_type_of(&self, object_key: &str) -> Option<String> {
        self.objects.get(object_key).map(|o| o.1.clone())
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.iter().map(|o| o.key().clone()).collect()
    }
}

#[async_trait]
impl StorageService for MemoryStorageService {
    async fn get_bytes(&self, object_key: &str) -> AppResult<Vec<u8>> {
        self.objects
            .get(object_key)
            .map(|o| o.0.clone())
            .ok_or_else(|| AppError::NotFound(format!("No stored object at {object_key}")))
    }

    async fn put(&self, object_key: &str, bytes: Vec<u8>, content_type: &str) -> AppResult<()> {
        self.objects
            .insert(object_key.to_string(), (bytes, content_type.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get_roundtrips_bytes_and_content_type() {
        let storage = MemoryStorageService::new();
        storage
            .put("aud/u/1/2/x.mp3", vec![1, 2, 3], "audio/mpeg")
            .await
            .unwrap();
        assert_eq!(storage.get_bytes("aud/u/1/2/x.mp3").await.unwrap(), vec![1, 2, 3]);
        assert_eq!(
            storage.content_type_of("aud/u/1/2/x.mp3").as_deref(),
            Some("audio/mpeg")
        );
    }

    #[tokio::test]
    async fn missing_object_is_not_found() {
        let storage = MemoryStorageService::new();
        assert!(matches!(
            storage.get_bytes("nope").await,
            Err(AppError::NotFound(_))
        ));
    }
}
