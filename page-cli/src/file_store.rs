//! Page storage backed by a single JSON file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use pagecraft_sync::store::{merge_publish_state, merge_settings, upsert_component};
use pagecraft_sync::{PageSettings, PageStore, StoreError};
use pagecraft_types::{ComponentId, ComponentRecord, PageId, PublishRecord};
use serde_json::{Map, Value};
use tokio::sync::Mutex;

/// Stores one page in one JSON file. Every write rewrites the file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    page_id: PageId,
    lock: Mutex<()>,
}

impl JsonFileStore {
    /// Store for the page in `path`.
    pub fn new(path: &Path, page_id: PageId) -> Self {
        Self {
            path: path.to_path_buf(),
            page_id,
            lock: Mutex::new(()),
        }
    }

    async fn read(&self, page_id: &PageId) -> Result<Value, StoreError> {
        if *page_id != self.page_id {
            return Err(StoreError::PageNotFound(*page_id));
        }
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::PageNotFound(*page_id))
            }
            Err(e) => return Err(StoreError::ReadFailed(e.to_string())),
        };
        serde_json::from_str(&text).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    async fn update<F>(&self, page_id: &PageId, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Map<String, Value>) -> Result<(), StoreError>,
    {
        let _guard = self.lock.lock().await;
        let mut value = self.read(page_id).await?;
        let page = value
            .as_object_mut()
            .ok_or_else(|| StoreError::Serialization("page is not a JSON object".into()))?;
        f(page)?;
        let text = serde_json::to_string_pretty(&value)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        tokio::fs::write(&self.path, text)
            .await
            .map_err(|e| StoreError::WriteFailed(e.to_string()))
    }
}

#[async_trait]
impl PageStore for JsonFileStore {
    async fn read_page(&self, page_id: &PageId) -> Result<Value, StoreError> {
        self.read(page_id).await
    }

    async fn write_page(&self, page_id: &PageId, settings: &PageSettings) -> Result<(), StoreError> {
        self.update(page_id, |page| merge_settings(page, settings))
            .await
    }

    async fn write_component(
        &self,
        page_id: &PageId,
        component_id: &ComponentId,
        record: &ComponentRecord,
    ) -> Result<(), StoreError> {
        self.update(page_id, |page| upsert_component(page, component_id, record))
            .await
    }

    async fn write_publish_state(
        &self,
        page_id: &PageId,
        record: &PublishRecord,
    ) -> Result<(), StoreError> {
        self.update(page_id, |page| merge_publish_state(page, record))
            .await
    }
}
