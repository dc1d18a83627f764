//! # page-core
//!
//! Pure logic for pagecraft (no I/O, instant tests).
//!
//! This crate turns a [`PageDocument`](pagecraft_types::PageDocument) into a
//! static artifact and decides when the editor's copy should be persisted,
//! without touching the network or disk.
//!
//! ## Modules
//!
//! - [`vocabulary`] - The closed utility-class vocabulary and per-variation class maps
//! - [`shaker`] - Emits only the CSS a document actually references
//! - [`compiler`] - Document → markup + stylesheet + script
//! - [`order`] - `order_index` normalization and reordering
//! - [`flush`] - Debounce / periodic / forced save decisions
//! - [`deploy_state`] - Deployment lifecycle state machine
//!
//! The I/O (storage writes, hosting API calls, timers) is performed by
//! `page-sync` and `page-deploy`, which interpret the actions produced here.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod compiler;
pub mod deploy_state;
mod error;
pub mod flush;
pub mod order;
pub mod shaker;
pub mod vocabulary;

pub use compiler::{compile, compile_with_diagnostics, CompileDegraded, Compilation, DegradeReason};
pub use deploy_state::{DeployAction, DeployEvent, DeployState, PollPolicy, RemoteStatus};
pub use error::StyleError;
pub use flush::{FlushAction, FlushEvent, FlushMachine, FlushTiming, SaveTrigger};
pub use order::{move_component, normalize_order, OrderReport};
pub use shaker::shake;
pub use vocabulary::{Breakpoint, ClassMap, ElementClasses, StyleVocabulary, VariationSpec, Viewport};
