//! Durable page storage.
//!
//! Pages are stored as JSON so that documents written by older editors can
//! be read back and migrated. Writes are granular: the page-level settings,
//! one component, or the publish fields.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pagecraft_types::{
    legacy, ComponentId, ComponentRecord, PageDocument, PageId, PublishRecord, Seo, Theme,
};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tokio::sync::watch;

use crate::error::StoreError;

/// Page-level fields persisted by [`PageStore::write_page`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSettings {
    /// URL slug.
    pub slug: String,
    /// Theme.
    pub theme: Theme,
    /// Search metadata.
    pub seo: Seo,
    /// Analytics ids.
    pub tracking: BTreeMap<String, String>,
    /// Custom domain.
    pub custom_domain: Option<String>,
}

impl From<&PageDocument> for PageSettings {
    fn from(document: &PageDocument) -> Self {
        Self {
            slug: document.slug.clone(),
            theme: document.theme.clone(),
            seo: document.seo.clone(),
            tracking: document.tracking.clone(),
            custom_domain: document.custom_domain.clone(),
        }
    }
}

/// Trait for durable page storage.
#[async_trait]
pub trait PageStore: Send + Sync {
    /// Read the stored page JSON.
    ///
    /// Returns `PageNotFound` if the page does not exist.
    async fn read_page(&self, page_id: &PageId) -> Result<Value, StoreError>;

    /// Persist page-level fields: the theme plus slug, SEO, tracking and
    /// custom domain.
    async fn write_page(&self, page_id: &PageId, settings: &PageSettings)
        -> Result<(), StoreError>;

    /// Upsert one component.
    async fn write_component(
        &self,
        page_id: &PageId,
        component_id: &ComponentId,
        record: &ComponentRecord,
    ) -> Result<(), StoreError>;

    /// Persist status, hosting site, URL and last error.
    async fn write_publish_state(
        &self,
        page_id: &PageId,
        record: &PublishRecord,
    ) -> Result<(), StoreError>;
}

/// One write observed by [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteRecord {
    /// `write_page`.
    Page(PageId),
    /// `write_component`.
    Component(PageId, ComponentId),
    /// `write_publish_state`.
    PublishState(PageId),
}

#[derive(Debug, Default)]
struct MemoryStoreInner {
    pages: HashMap<PageId, Value>,
    writes: Vec<WriteRecord>,
    in_flight: usize,
    max_in_flight: usize,
    fail_next_write: Option<String>,
    fail_writes: Option<String>,
}

/// In-memory page store for testing.
///
/// Writes can be held open with [`MemoryStore::hold_writes`] to observe
/// overlapping saves; [`MemoryStore::max_concurrent_writes`] reports the
/// highest overlap seen.
#[derive(Debug)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryStoreInner>>,
    gate: Arc<watch::Sender<bool>>,
    started: Arc<watch::Sender<usize>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            inner: Arc::default(),
            gate: Arc::new(watch::channel(true).0),
            started: Arc::new(watch::channel(0).0),
        }
    }
}

impl Clone for MemoryStore {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            gate: Arc::clone(&self.gate),
            started: Arc::clone(&self.started),
        }
    }
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a page document.
    pub fn insert(&self, document: &PageDocument) -> Result<(), StoreError> {
        let value = to_value(document)?;
        self.insert_raw(document.id, value);
        Ok(())
    }

    /// Store raw page JSON (e.g. a legacy document).
    pub fn insert_raw(&self, page_id: PageId, value: Value) {
        self.inner.lock().unwrap().pages.insert(page_id, value);
    }

    /// Raw stored JSON.
    pub fn raw(&self, page_id: &PageId) -> Option<Value> {
        self.inner.lock().unwrap().pages.get(page_id).cloned()
    }

    /// Stored page, migrated into a document.
    pub fn page(&self, page_id: &PageId) -> Option<PageDocument> {
        let value = self.raw(page_id)?;
        legacy::migrate_page_value(value).ok().map(|(doc, _)| doc)
    }

    /// Every write so far, in order.
    pub fn writes(&self) -> Vec<WriteRecord> {
        self.inner.lock().unwrap().writes.clone()
    }

    /// Number of writes so far.
    pub fn write_count(&self) -> usize {
        self.inner.lock().unwrap().writes.len()
    }

    /// Number of `write_page` calls so far.
    pub fn page_write_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap()
            .writes
            .iter()
            .filter(|w| matches!(w, WriteRecord::Page(_)))
            .count()
    }

    /// Highest number of writes observed running at once.
    pub fn max_concurrent_writes(&self) -> usize {
        self.inner.lock().unwrap().max_in_flight
    }

    /// Cause the next write to fail.
    pub fn fail_next_write(&self, error: &str) {
        self.inner.lock().unwrap().fail_next_write = Some(error.to_string());
    }

    /// Fail every write until [`MemoryStore::heal`] is called.
    pub fn fail_writes(&self, error: &str) {
        self.inner.lock().unwrap().fail_writes = Some(error.to_string());
    }

    /// Stop failing writes.
    pub fn heal(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_writes = None;
        inner.fail_next_write = None;
    }

    /// Block writes until [`MemoryStore::release_writes`].
    pub fn hold_writes(&self) {
        self.gate.send_replace(false);
    }

    /// Let held writes proceed.
    pub fn release_writes(&self) {
        self.gate.send_replace(true);
    }

    /// Wait until at least `count` writes have started.
    pub async fn writes_started(&self, count: usize) {
        let mut rx = self.started.subscribe();
        let _ = rx.wait_for(|started| *started >= count).await;
    }

    async fn begin_write(&self) -> Result<(), StoreError> {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.in_flight += 1;
            inner.max_in_flight = inner.max_in_flight.max(inner.in_flight);
        }
        self.started.send_modify(|started| *started += 1);

        let mut gate = self.gate.subscribe();
        let _ = gate.wait_for(|open| *open).await;

        let mut inner = self.inner.lock().unwrap();
        inner.in_flight -= 1;
        if let Some(error) = inner.fail_next_write.take() {
            return Err(StoreError::WriteFailed(error));
        }
        if let Some(error) = inner.fail_writes.clone() {
            return Err(StoreError::WriteFailed(error));
        }
        Ok(())
    }

    fn with_page<F>(&self, page_id: &PageId, write: WriteRecord, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Map<String, Value>) -> Result<(), StoreError>,
    {
        let mut inner = self.inner.lock().unwrap();
        let page = inner
            .pages
            .get_mut(page_id)
            .and_then(Value::as_object_mut)
            .ok_or(StoreError::PageNotFound(*page_id))?;
        f(page)?;
        inner.writes.push(write);
        Ok(())
    }
}

fn to_value<T: Serialize>(value: &T) -> Result<Value, StoreError> {
    serde_json::to_value(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Merge page settings into stored page JSON.
pub fn merge_settings(
    page: &mut Map<String, Value>,
    settings: &PageSettings,
) -> Result<(), StoreError> {
    if let Value::Object(fields) = to_value(settings)? {
        page.extend(fields);
    }
    Ok(())
}

/// Insert or replace one component in stored page JSON, matched by id.
pub fn upsert_component(
    page: &mut Map<String, Value>,
    component_id: &ComponentId,
    record: &ComponentRecord,
) -> Result<(), StoreError> {
    let mut value = to_value(record)?;
    if let Some(object) = value.as_object_mut() {
        object.insert("id".to_string(), json!(component_id.as_str()));
    }
    let components = page
        .entry("components")
        .or_insert_with(|| Value::Array(Vec::new()))
        .as_array_mut()
        .ok_or_else(|| StoreError::Serialization("components is not an array".into()))?;
    let existing = components
        .iter_mut()
        .find(|c| c.get("id").and_then(Value::as_str) == Some(component_id.as_str()));
    match existing {
        Some(slot) => *slot = value,
        None => components.push(value),
    }
    Ok(())
}

/// Set the publish fields of stored page JSON.
pub fn merge_publish_state(
    page: &mut Map<String, Value>,
    record: &PublishRecord,
) -> Result<(), StoreError> {
    page.insert("status".to_string(), to_value(&record.status)?);
    page.insert("hostingSiteId".to_string(), json!(record.hosting_site_id));
    page.insert("publishedUrl".to_string(), json!(record.published_url));
    page.insert("lastPublishError".to_string(), json!(record.error));
    Ok(())
}

#[async_trait]
impl PageStore for MemoryStore {
    async fn read_page(&self, page_id: &PageId) -> Result<Value, StoreError> {
        self.raw(page_id).ok_or(StoreError::PageNotFound(*page_id))
    }

    async fn write_page(
        &self,
        page_id: &PageId,
        settings: &PageSettings,
    ) -> Result<(), StoreError> {
        self.begin_write().await?;
        self.with_page(page_id, WriteRecord::Page(*page_id), |page| {
            merge_settings(page, settings)
        })
    }

    async fn write_component(
        &self,
        page_id: &PageId,
        component_id: &ComponentId,
        record: &ComponentRecord,
    ) -> Result<(), StoreError> {
        self.begin_write().await?;
        let write = WriteRecord::Component(*page_id, component_id.clone());
        self.with_page(page_id, write, |page| {
            upsert_component(page, component_id, record)
        })
    }

    async fn write_publish_state(
        &self,
        page_id: &PageId,
        record: &PublishRecord,
    ) -> Result<(), StoreError> {
        self.begin_write().await?;
        self.with_page(page_id, WriteRecord::PublishState(*page_id), |page| {
            merge_publish_state(page, record)
        })
    }
}
