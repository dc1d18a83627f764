//! Open sessions, keyed by page.
//!
//! A process keeps at most one [`SyncSession`] per page, so that edits from
//! every editor handle funnel through a single save lane.

use std::sync::Arc;

use dashmap::DashMap;
use pagecraft_types::PageId;
use tracing::{debug, warn};

use crate::error::SessionError;
use crate::scheduler::Scheduler;
use crate::session::{SessionConfig, SyncSession};
use crate::store::PageStore;

/// Registry of open sessions.
pub struct SessionRegistry {
    sessions: DashMap<PageId, SyncSession>,
    store: Arc<dyn PageStore>,
    scheduler: Arc<dyn Scheduler>,
    config: SessionConfig,
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("sessions", &self.sessions.len())
            .field("config", &self.config)
            .finish()
    }
}

impl SessionRegistry {
    /// Create an empty registry. Sessions it opens share `store` and
    /// `scheduler`.
    pub fn new(
        store: Arc<dyn PageStore>,
        scheduler: Arc<dyn Scheduler>,
        config: SessionConfig,
    ) -> Self {
        Self {
            sessions: DashMap::new(),
            store,
            scheduler,
            config,
        }
    }

    /// Session for `page_id`, opening it if needed.
    pub async fn open(&self, page_id: PageId) -> Result<SyncSession, SessionError> {
        if let Some(session) = self.get(&page_id) {
            return Ok(session);
        }
        let session = SyncSession::initialize(
            page_id,
            Arc::clone(&self.store),
            Arc::clone(&self.scheduler),
            self.config,
        )
        .await?;

        let existing = match self.sessions.entry(page_id) {
            dashmap::mapref::entry::Entry::Occupied(entry) => Some(entry.get().clone()),
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                entry.insert(session.clone());
                None
            }
        };
        match existing {
            Some(winner) => {
                debug!(page_id = %page_id, "session opened concurrently, keeping the first");
                session.close().await;
                Ok(winner)
            }
            None => Ok(session),
        }
    }

    /// Session for `page_id`, if open.
    pub fn get(&self, page_id: &PageId) -> Option<SyncSession> {
        self.sessions.get(page_id).map(|entry| entry.value().clone())
    }

    /// Force-save and close the session for `page_id`.
    ///
    /// The session is removed even if the final save fails.
    pub async fn close(&self, page_id: &PageId) -> Result<(), SessionError> {
        let Some((_, session)) = self.sessions.remove(page_id) else {
            return Ok(());
        };
        let saved = if session.is_dirty().await {
            session.force_save().await
        } else {
            Ok(())
        };
        session.close().await;
        saved
    }

    /// Force-save every open session. Returns the pages whose save failed.
    pub async fn force_save_all(&self) -> Vec<(PageId, SessionError)> {
        let sessions: Vec<SyncSession> = self
            .sessions
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        let mut failures = Vec::new();
        for session in sessions {
            if let Err(e) = session.force_save().await {
                warn!(page_id = %session.page_id(), error = %e, "force save failed");
                failures.push((session.page_id(), e));
            }
        }
        failures
    }

    /// Number of open sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no session is open.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
