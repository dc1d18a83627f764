//! # page-sync
//!
//! Editing sessions for pagecraft pages.
//!
//! A [`SyncSession`] holds the editor's copy of a page and keeps storage in
//! step with it without writing on every keystroke.
//!
//! ## Features
//!
//! - **Debounced saves**: a burst of edits becomes one save after a quiet period
//! - **Periodic flush**: dirty pages are saved on a fixed interval as a safety net
//! - **Forced saves**: `force_save` writes now and reports failure to the caller
//! - **Save lane**: at most one save runs per page; overlapping requests coalesce
//! - **Publish pipeline**: save, compile and deploy in one call ([`publish`])
//! - **Injected time**: timers go through a [`Scheduler`] ([`ManualScheduler`] in tests)
//!
//! The save decisions themselves live in `pagecraft_core::flush`; this crate
//! performs the I/O they call for.
//!
//! ## Example
//!
//! ```ignore
//! use pagecraft_sync::{SessionConfig, SyncSession, TokioScheduler};
//!
//! let session = SyncSession::initialize(page_id, store, Arc::new(TokioScheduler::new()),
//!     SessionConfig::default()).await?;
//! session.update_theme(theme).await?;
//! session.force_save().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod publish;
mod registry;
pub mod scheduler;
mod session;
pub mod store;

pub use error::{PublishError, SessionError, StoreError};
pub use publish::publish;
pub use registry::SessionRegistry;
pub use scheduler::{ManualScheduler, Scheduler, Task, TimerHandle, TokioScheduler};
pub use session::{SessionConfig, SyncSession};
pub use store::{MemoryStore, PageSettings, PageStore, WriteRecord};
