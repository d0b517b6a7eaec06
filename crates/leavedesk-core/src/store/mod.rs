//! Lifecycle store: the single owner of the request collection.
//!
//! This module provides:
//! - `LifecycleStore`: create, edit and status-transition operations
//! - `NotificationSink`: where the store reports successful mutations
//! - `StoreError`, `ValidationError`: typed failures for callers
//!
//! The collection is persisted locally under `STORAGE_KEY` after every
//! mutation, and the repository's `"requests"` cache entry is invalidated so
//! the next read observes the write.

pub mod error;
pub mod lifecycle;
pub mod notify;
pub mod validation;

pub use error::StoreError;
pub use lifecycle::{LifecycleStore, DEFAULT_REJECTION_REASON, STORAGE_KEY};
pub use notify::{NoticeLog, NotificationSink, TracingSink};
pub use validation::ValidationError;
