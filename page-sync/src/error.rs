//! Error types for page-sync.

use pagecraft_core::StyleError;
use pagecraft_deploy::DeployError;
use pagecraft_types::{ComponentId, ModelError, PageId};
use thiserror::Error;

/// Errors from a [`PageStore`](crate::PageStore).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Page does not exist.
    #[error("page not found: {0}")]
    PageNotFound(PageId),

    /// Write was not acknowledged.
    #[error("write failed: {0}")]
    WriteFailed(String),

    /// Read failed.
    #[error("read failed: {0}")]
    ReadFailed(String),

    /// Stored data could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Errors from a [`SyncSession`](crate::SyncSession).
#[derive(Error, Debug)]
pub enum SessionError {
    /// Initial read failed.
    #[error("failed to load page: {0}")]
    LoadFailed(#[source] StoreError),

    /// Stored page could not be migrated.
    #[error("stored page is invalid: {0}")]
    InvalidDocument(#[from] ModelError),

    /// A forced save was not acknowledged.
    #[error("storage write failed: {0}")]
    StorageWriteFailed(#[source] StoreError),

    /// No component with this id.
    #[error("component not found: {0}")]
    ComponentNotFound(ComponentId),

    /// Style override rejected.
    #[error("invalid style for {element}: {source}")]
    InvalidStyle {
        /// Element key.
        element: String,
        /// What was wrong.
        #[source]
        source: StyleError,
    },

    /// Slug is not URL-safe.
    #[error("invalid slug: {0:?}")]
    InvalidSlug(String),

    /// Slug change refused after a hosting site exists.
    #[error("slug is locked by hosting site {site_id}")]
    SlugLocked {
        /// Hosting site that owns the slug.
        site_id: String,
    },

    /// Session was closed.
    #[error("session closed")]
    Closed,
}

/// Errors from [`publish`](crate::publish).
#[derive(Error, Debug)]
pub enum PublishError {
    /// Saving or status persistence failed.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// Deployment failed; the page was returned to draft.
    #[error("deploy error: {0}")]
    Deploy(#[from] DeployError),

    /// A publish is already running for this page.
    #[error("page is already publishing")]
    AlreadyPublishing,
}
