//! StackForge core library: run domain types, history, configuration
//! extraction, and run persistence.
//!
//! - [`types`]: [`Stage`], [`BuildRequest`], [`RunState`] and newtypes
//! - [`history`]: [`HistoryEvent`] and the [`History`] read seam
//! - [`extractor`]: [`resolve_config`]
//! - [`store`]: load / save runs and their history
//! - [`error`]: [`CoreError`]

pub mod error;
pub mod extractor;
pub mod history;
pub mod store;
pub mod types;

pub use error::CoreError;
pub use extractor::resolve_config;
pub use history::{BuildStartRecord, History, HistoryEvent};
pub use types::{platform, BuildRequest, ProjectName, RunId, RunState, Stage};
