//! # page-types
//!
//! Page document model for the pagecraft publishing core.
//!
//! This crate provides the foundational types used across all pagecraft crates:
//! - [`PageId`], [`ComponentId`] - Identity types (durable vs placeholder)
//! - [`PageDocument`], [`ComponentInstance`] - The editable page document
//! - [`ComponentVariationMetadata`] - Read-only reference data for a variation
//! - [`CompiledArtifact`] - Output of the compiler
//! - [`ModelError`] - Error types
//! - [`legacy`] - One-shot migration of documents saved before variations were required

#![warn(missing_docs)]
#![warn(clippy::all)]

mod artifact;
mod component;
mod document;
mod error;
mod ids;
pub mod legacy;

pub use artifact::CompiledArtifact;
pub use component::{
    ActionKind, ComponentInstance, ComponentRecord, ComponentVariationMetadata, ContentMap,
    CustomAction, StyleMap, VariationRef, VisibilityKey,
};
pub use document::{PageDocument, PageStatus, PublishRecord, Seo, TextDirection, Theme};
pub use error::ModelError;
pub use ids::{ComponentId, PageId, PLACEHOLDER_PREFIX};
