//! Error types for the page model.

use thiserror::Error;

use crate::PageStatus;

/// Errors that can occur when building or mutating a page document.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Page id is not a UUID
    #[error("invalid page id: {0}")]
    InvalidPageId(String),

    /// Component id is empty or otherwise unusable
    #[error("invalid component id: {0:?}")]
    InvalidComponentId(String),

    /// Slug contains characters that are not URL-safe
    #[error("invalid slug: {0:?}")]
    InvalidSlug(String),

    /// Slug cannot change once a hosting site has been provisioned for it
    #[error("slug is locked by hosting site {site_id}")]
    SlugLocked {
        /// The hosting site that owns the current slug.
        site_id: String,
    },

    /// Page status transition not allowed
    #[error("invalid status transition: {from} -> {to}")]
    InvalidStatusTransition {
        /// Current status.
        from: PageStatus,
        /// Requested status.
        to: PageStatus,
    },

    /// Document JSON could not be decoded
    #[error("malformed document: {0}")]
    Malformed(String),
}
