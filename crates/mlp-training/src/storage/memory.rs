use super::ObjectStore;
use crate::error::{TrainingError, TrainingResult};
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// In-process object store with failure injection.
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    objects: Mutex<BTreeMap<(String, String), StoredObject>>,
    failing_keys: Mutex<HashSet<String>>,
    unavailable: bool,
}

impl InMemoryObjectStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every request fails as if the endpoint were unreachable.
    #[must_use]
    pub fn unavailable() -> Self {
        Self { unavailable: true, ..Self::default() }
    }

    /// Make every `put` to `key` fail.
    #[must_use]
    pub fn failing_on(self, key: &str) -> Self {
        if let Ok(mut keys) = self.failing_keys.lock() {
            keys.insert(key.to_string());
        }
        self
    }

    #[must_use]
    pub fn get(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.objects
            .lock()
            .ok()
            .and_then(|o| o.get(&(bucket.to_string(), key.to_string())).cloned())
    }

    /// Keys in `bucket`, sorted.
    #[must_use]
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.objects
            .lock()
            .map(|o| o.keys().filter(|(b, _)| b == bucket).map(|(_, k)| k.clone()).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.lock().map(|o| o.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(&self) -> TrainingResult<()> {
        if self.unavailable {
            return Err(TrainingError::StorageUnavailable("in-memory store marked unavailable".to_string()));
        }
        Ok(())
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn put(&self, bucket: &str, key: &str, bytes: Vec<u8>, content_type: &str) -> TrainingResult<()> {
        self.check_available()?;
        let failing = self.failing_keys.lock().map(|k| k.contains(key)).unwrap_or(false);
        if failing {
            return Err(TrainingError::UploadFailed { key: key.to_string(), reason: "injected failure".to_string() });
        }

        let mut objects = self
            .objects
            .lock()
            .map_err(|_| TrainingError::StorageUnavailable("object map poisoned".to_string()))?;
        objects.insert(
            (bucket.to_string(), key.to_string()),
            StoredObject { bytes, content_type: content_type.to_string() },
        );
        Ok(())
    }

    fn delete(&self, bucket: &str, key: &str) -> TrainingResult<()> {
        self.check_available()?;
        let mut objects = self
            .objects
            .lock()
            .map_err(|_| TrainingError::StorageUnavailable("object map poisoned".to_string()))?;
        objects.remove(&(bucket.to_string(), key.to_string()));
        Ok(())
    }
}
