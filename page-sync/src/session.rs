//! Editing session for one page.
//!
//! The session owns the in-memory document, buffers edits and decides when to
//! persist them. Decisions come from [`FlushMachine`]; this module executes
//! them: it arms timers through the injected [`Scheduler`] and performs store
//! writes through the [`PageStore`].
//!
//! ## Guarantees
//!
//! - At most one save runs at a time (the save lane).
//! - Requests that arrive during a save are coalesced into one follow-up.
//! - `dirty` is cleared only when the saved snapshot is the current revision.
//! - Background save failures are logged; the page stays dirty until the next
//!   periodic tick retries. `force_save` propagates its failure.

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use pagecraft_core::compiler::styles::merge_style_override;
use pagecraft_core::{
    normalize_order, FlushAction, FlushEvent, FlushMachine, FlushTiming, SaveTrigger,
};
use pagecraft_types::{
    legacy, ComponentId, ComponentInstance, ComponentRecord, ModelError, PageDocument, PageId,
    PageStatus, PublishRecord, Seo, StyleMap, Theme,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{PublishError, SessionError, StoreError};
use crate::scheduler::{Scheduler, TimerHandle};
use crate::store::{PageSettings, PageStore};

/// Session timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Quiet period after the last edit before saving.
    pub debounce: Duration,
    /// Interval of the periodic flush.
    pub flush_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let timing = FlushTiming::default();
        Self {
            debounce: timing.debounce,
            flush_interval: timing.flush_interval,
        }
    }
}

impl SessionConfig {
    /// Set the debounce delay.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Set the periodic flush interval.
    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }

    fn timing(&self) -> FlushTiming {
        FlushTiming {
            debounce: self.debounce,
            flush_interval: self.flush_interval,
        }
    }
}

struct SessionState {
    document: PageDocument,
    machine: FlushMachine,
    last_saved_at: Option<u64>,
    debounce: Option<TimerHandle>,
    periodic: Option<TimerHandle>,
}

struct PendingWrite {
    revision: u64,
    trigger: SaveTrigger,
    snapshot: PageDocument,
}

struct Shared {
    page_id: PageId,
    store: Arc<dyn PageStore>,
    scheduler: Arc<dyn Scheduler>,
    state: Mutex<SessionState>,
    lane: Mutex<()>,
}

/// An editing session. Cloning yields another handle to the same session.
#[derive(Clone)]
pub struct SyncSession {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for SyncSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncSession")
            .field("page_id", &self.shared.page_id)
            .finish()
    }
}

impl SyncSession {
    /// Load a page and start its periodic flush.
    ///
    /// Legacy documents are migrated and component order is re-sequenced;
    /// either fix marks the page dirty so it is written back.
    pub async fn initialize(
        page_id: PageId,
        store: Arc<dyn PageStore>,
        scheduler: Arc<dyn Scheduler>,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        let raw = store
            .read_page(&page_id)
            .await
            .map_err(SessionError::LoadFailed)?;
        let (mut document, report) = legacy::migrate_page_value(raw)?;
        if document.id != page_id {
            warn!(page_id = %page_id, stored_id = %document.id, "stored id differs, using requested id");
            document.id = page_id;
        }
        for (id, variation) in &report.recovered {
            info!(page_id = %page_id, component_id = %id, %variation, "recovered variation from legacy id");
        }
        for id in &report.unresolved {
            warn!(page_id = %page_id, component_id = %id, "component variation unresolved");
        }
        let order = normalize_order(&mut document.components);
        if order.changed() {
            debug!(page_id = %page_id, resequenced = order.resequenced, "normalized component order");
        }
        if document.status == PageStatus::Publishing {
            warn!(page_id = %page_id, "page was left publishing, returning it to draft");
            document.status = PageStatus::Draft;
            document.last_publish_error = Some("publish interrupted".to_string());
        }
        let needs_write = !report.is_clean() || order.changed();
        let components = document.components.len();

        let shared = Arc::new(Shared {
            page_id,
            store,
            scheduler,
            state: Mutex::new(SessionState {
                document,
                machine: FlushMachine::new(config.timing()),
                last_saved_at: None,
                debounce: None,
                periodic: None,
            }),
            lane: Mutex::new(()),
        });
        {
            let mut state = shared.state.lock().await;
            let mut actions = state.machine.on_event(FlushEvent::Started);
            if needs_write {
                actions.extend(state.machine.on_event(FlushEvent::Edited));
            }
            shared.apply(&mut state, actions);
        }
        info!(page_id = %page_id, components, "session opened");
        Ok(Self { shared })
    }

    /// Replace the component list.
    pub async fn update_components(
        &self,
        components: Vec<ComponentInstance>,
    ) -> Result<(), SessionError> {
        self.edit(|document| {
            document.components = components;
            let order = normalize_order(&mut document.components);
            if order.changed() {
                debug!(page_id = %document.id, resequenced = order.resequenced, "normalized component order");
            }
            Ok(())
        })
        .await
    }

    /// Replace the theme.
    pub async fn update_theme(&self, theme: Theme) -> Result<(), SessionError> {
        self.edit(|document| {
            document.theme = theme;
            Ok(())
        })
        .await
    }

    /// Merge `styles` into (or, with `replace`, substitute for) the overrides
    /// of one element. In merge mode an empty value removes that property.
    pub async fn update_component_style_override(
        &self,
        component_id: &ComponentId,
        element_id: &str,
        styles: StyleMap,
        replace: bool,
    ) -> Result<(), SessionError> {
        self.edit(|document| {
            let component = document
                .component_mut(component_id)
                .ok_or_else(|| SessionError::ComponentNotFound(component_id.clone()))?;
            let existing = component
                .style_overrides
                .get(element_id)
                .cloned()
                .unwrap_or_default();
            let merged = merge_style_override(&existing, &styles, replace).map_err(|source| {
                SessionError::InvalidStyle {
                    element: element_id.to_string(),
                    source,
                }
            })?;
            if merged.is_empty() {
                component.style_overrides.remove(element_id);
            } else {
                component
                    .style_overrides
                    .insert(element_id.to_string(), merged);
            }
            Ok(())
        })
        .await
    }

    /// Replace the SEO metadata.
    pub async fn update_seo(&self, seo: Seo) -> Result<(), SessionError> {
        self.edit(|document| {
            document.seo = seo;
            Ok(())
        })
        .await
    }

    /// Replace the tracking ids.
    pub async fn update_tracking(
        &self,
        tracking: BTreeMap<String, String>,
    ) -> Result<(), SessionError> {
        self.edit(|document| {
            document.tracking = tracking;
            Ok(())
        })
        .await
    }

    /// Change the slug. Refused once a hosting site exists.
    pub async fn update_slug(&self, slug: &str) -> Result<(), SessionError> {
        self.edit(|document| {
            document.set_slug(slug).map_err(|e| match e {
                ModelError::SlugLocked { site_id } => SessionError::SlugLocked { site_id },
                ModelError::InvalidSlug(slug) => SessionError::InvalidSlug(slug),
                other => SessionError::InvalidDocument(other),
            })
        })
        .await
    }

    /// Move the component at position `from` to position `to`.
    ///
    /// Returns `false`, without marking the page dirty, when either position
    /// is out of range.
    pub async fn move_component(&self, from: usize, to: usize) -> Result<bool, SessionError> {
        self.edit_if(|document| {
            Ok(pagecraft_core::move_component(&mut document.components, from, to))
        })
        .await
    }

    /// Save now.
    ///
    /// Cancels the pending debounce, waits for any save in flight and then
    /// writes the current document, even if it is clean. Resolves once the
    /// store has acknowledged every write.
    pub async fn force_save(&self) -> Result<(), SessionError> {
        let shared = &self.shared;
        {
            let mut state = shared.state.lock().await;
            if state.machine.is_closed() {
                return Err(SessionError::Closed);
            }
            let actions = state.machine.on_event(FlushEvent::ForceRequested);
            shared.apply(&mut state, actions);
        }

        let _lane = shared.lane.lock().await;
        let write = {
            let mut state = shared.state.lock().await;
            let actions = state.machine.on_event(FlushEvent::LaneAcquired {
                trigger: SaveTrigger::Force,
            });
            shared.take_write(&mut state, actions)
        };
        match write {
            Some(write) => shared
                .write_loop(write)
                .await
                .map_err(SessionError::StorageWriteFailed),
            None => Err(SessionError::Closed),
        }
    }

    /// Stop all timers. Later edits and saves return `Closed`.
    pub async fn close(&self) {
        let shared = &self.shared;
        let mut state = shared.state.lock().await;
        if state.machine.is_closed() {
            return;
        }
        let dirty = state.machine.is_dirty();
        let actions = state.machine.on_event(FlushEvent::Closed);
        shared.apply(&mut state, actions);
        if dirty {
            warn!(page_id = %shared.page_id, "session closed with unsaved edits");
        } else {
            info!(page_id = %shared.page_id, "session closed");
        }
    }

    /// Page id.
    pub fn page_id(&self) -> PageId {
        self.shared.page_id
    }

    /// Whether there are edits not yet persisted.
    pub async fn is_dirty(&self) -> bool {
        self.shared.state.lock().await.machine.is_dirty()
    }

    /// Whether a save is running.
    pub async fn is_saving(&self) -> bool {
        self.shared.state.lock().await.machine.is_saving()
    }

    /// Whether the session was closed.
    pub async fn is_closed(&self) -> bool {
        self.shared.state.lock().await.machine.is_closed()
    }

    /// Snapshot of the current document.
    pub async fn document(&self) -> PageDocument {
        self.shared.state.lock().await.document.clone()
    }

    /// Scheduler time of the last acknowledged save, in milliseconds.
    pub async fn last_saved_at(&self) -> Option<u64> {
        self.shared.state.lock().await.last_saved_at
    }

    /// Move the page to `publishing` and persist that. Returns the document
    /// to compile.
    pub(crate) async fn begin_publish(&self) -> Result<PageDocument, PublishError> {
        let shared = &self.shared;
        let (record, snapshot, previous) = {
            let mut state = shared.state.lock().await;
            if state.machine.is_closed() {
                return Err(SessionError::Closed.into());
            }
            let previous = state.document.clone();
            if previous.status == PageStatus::Publishing {
                return Err(PublishError::AlreadyPublishing);
            }
            state
                .document
                .transition_status(PageStatus::Publishing)
                .map_err(SessionError::from)?;
            state.document.last_publish_error = None;
            (state.document.publish_record(), state.document.clone(), previous)
        };
        if let Err(e) = shared.store.write_publish_state(&shared.page_id, &record).await {
            let mut state = shared.state.lock().await;
            state.document.status = previous.status;
            state.document.last_publish_error = previous.last_publish_error;
            return Err(SessionError::StorageWriteFailed(e).into());
        }
        Ok(snapshot)
    }

    /// Attach a newly provisioned hosting site to the page and persist it
    /// while the publish is still running.
    pub(crate) async fn record_site(&self, site_id: &str) -> Result<(), SessionError> {
        let shared = &self.shared;
        let record = {
            let mut state = shared.state.lock().await;
            state.document.hosting_site_id = Some(site_id.to_string());
            state.document.publish_record()
        };
        shared
            .store
            .write_publish_state(&shared.page_id, &record)
            .await
            .map_err(SessionError::StorageWriteFailed)
    }

    /// Record the outcome of a deploy and persist it.
    pub(crate) async fn finish_publish(
        &self,
        outcome: Result<(&str, &str), String>,
    ) -> Result<PublishRecord, SessionError> {
        let shared = &self.shared;
        let record = {
            let mut state = shared.state.lock().await;
            let document = &mut state.document;
            match outcome {
                Ok((site_id, url)) => {
                    document.transition_status(PageStatus::Published)?;
                    document.hosting_site_id = Some(site_id.to_string());
                    document.published_url = Some(url.to_string());
                    document.last_publish_error = None;
                }
                Err(reason) => {
                    document.transition_status(PageStatus::Draft)?;
                    document.last_publish_error = Some(reason);
                }
            }
            document.publish_record()
        };
        shared
            .store
            .write_publish_state(&shared.page_id, &record)
            .await
            .map_err(SessionError::StorageWriteFailed)?;
        Ok(record)
    }

    async fn edit<F>(&self, f: F) -> Result<(), SessionError>
    where
        F: FnOnce(&mut PageDocument) -> Result<(), SessionError>,
    {
        self.edit_if(|document| f(document).map(|()| true))
            .await
            .map(|_| ())
    }

    /// Apply `f`, which reports whether it changed the document. Only a
    /// change dirties the page and arms the debounce.
    async fn edit_if<F>(&self, f: F) -> Result<bool, SessionError>
    where
        F: FnOnce(&mut PageDocument) -> Result<bool, SessionError>,
    {
        let shared = &self.shared;
        let mut state = shared.state.lock().await;
        if state.machine.is_closed() {
            return Err(SessionError::Closed);
        }
        let changed = f(&mut state.document)?;
        if changed {
            let actions = state.machine.on_event(FlushEvent::Edited);
            shared.apply(&mut state, actions);
        }
        Ok(changed)
    }
}

impl Shared {
    /// Execute timer actions; return the ones that need the save lane.
    fn apply(
        self: &Arc<Self>,
        state: &mut SessionState,
        actions: Vec<FlushAction>,
    ) -> Vec<FlushAction> {
        let mut rest = Vec::new();
        for action in actions {
            match action {
                FlushAction::ArmDebounce { generation, delay } => {
                    state.debounce =
                        Some(self.arm(delay, FlushEvent::DebounceElapsed { generation }));
                }
                FlushAction::CancelDebounce => state.debounce = None,
                FlushAction::ArmPeriodic { delay } => {
                    state.periodic = Some(self.arm(delay, FlushEvent::PeriodicTick));
                }
                FlushAction::CancelTimers => {
                    state.debounce = None;
                    state.periodic = None;
                }
                other => rest.push(other),
            }
        }
        rest
    }

    fn arm(self: &Arc<Self>, delay: Duration, event: FlushEvent) -> TimerHandle {
        let weak: Weak<Shared> = Arc::downgrade(self);
        self.scheduler.schedule(
            delay,
            Box::pin(async move {
                if let Some(shared) = weak.upgrade() {
                    shared.on_timer(event).await;
                }
            }),
        )
    }

    async fn on_timer(self: Arc<Self>, event: FlushEvent) {
        debug!(page_id = %self.page_id, ?event, "timer fired");
        let requests = {
            let mut state = self.state.lock().await;
            let actions = state.machine.on_event(event);
            self.apply(&mut state, actions)
        };
        for action in requests {
            if let FlushAction::RequestSave { trigger } = action {
                self.background_save(trigger).await;
            }
        }
    }

    async fn background_save(self: &Arc<Self>, trigger: SaveTrigger) {
        let _lane = self.lane.lock().await;
        let write = {
            let mut state = self.state.lock().await;
            let actions = state.machine.on_event(FlushEvent::LaneAcquired { trigger });
            self.take_write(&mut state, actions)
        };
        let Some(write) = write else {
            debug!(page_id = %self.page_id, ?trigger, "nothing to save");
            return;
        };
        if let Err(e) = self.write_loop(write).await {
            warn!(page_id = %self.page_id, ?trigger, error = %e, "background save failed, page stays dirty");
        }
    }

    fn take_write(
        self: &Arc<Self>,
        state: &mut SessionState,
        actions: Vec<FlushAction>,
    ) -> Option<PendingWrite> {
        self.apply(state, actions)
            .into_iter()
            .find_map(|action| match action {
                FlushAction::Write { revision, trigger } => Some(PendingWrite {
                    revision,
                    trigger,
                    snapshot: state.document.clone(),
                }),
                _ => None,
            })
    }

    /// Write `first`, then any follow-ups the machine asks for while the lane
    /// is held. Returns the result of `first`.
    async fn write_loop(self: &Arc<Self>, first: PendingWrite) -> Result<(), StoreError> {
        let mut next = Some(first);
        let mut first_result = None;
        while let Some(write) = next.take() {
            let result = self.persist(&write.snapshot).await;
            {
                let mut state = self.state.lock().await;
                let actions = match &result {
                    Ok(()) => {
                        state.last_saved_at = Some(self.scheduler.now_ms());
                        debug!(
                            page_id = %self.page_id,
                            revision = write.revision,
                            trigger = ?write.trigger,
                            "saved"
                        );
                        state.machine.on_event(FlushEvent::SaveSucceeded {
                            revision: write.revision,
                        })
                    }
                    Err(_) => state.machine.on_event(FlushEvent::SaveFailed),
                };
                next = self.take_write(&mut state, actions);
            }
            match (&first_result, result) {
                (None, result) => first_result = Some(result),
                (Some(_), Err(e)) => {
                    warn!(page_id = %self.page_id, error = %e, "follow-up save failed, page stays dirty");
                }
                (Some(_), Ok(())) => {}
            }
        }
        first_result.unwrap_or(Ok(()))
    }

    /// Page settings first, then every durable component in order.
    async fn persist(&self, document: &PageDocument) -> Result<(), StoreError> {
        self.store
            .write_page(&self.page_id, &PageSettings::from(document))
            .await?;
        for component in document.ordered_components() {
            if !component.id.is_durable() {
                debug!(page_id = %self.page_id, component_id = %component.id, "skipping placeholder");
                continue;
            }
            self.store
                .write_component(&self.page_id, &component.id, &ComponentRecord::from(component))
                .await?;
        }
        Ok(())
    }
}
