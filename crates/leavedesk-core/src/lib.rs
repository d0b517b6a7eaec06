//! Leavedesk Core - request store, cache, API client and models for
//! time-off request tracking.
//!
//! This crate holds the parts of leavedesk that carry state and rules:
//!
//! - [`cache`]: key-value TTL cache that answers "is this still fresh?"
//! - [`repository`]: remote fetches mediated by the cache, with stale fallback
//! - [`store`]: the lifecycle store that owns the request collection and
//!   enforces status transitions and the no-self-approval rule
//! - [`visibility`]: role-based filtering and capability predicates
//!
//! Views and front ends build a [`store::LifecycleStore`] once and pass it
//! around by reference.

pub mod api;
pub mod cache;
pub mod models;
pub mod repository;
pub mod storage;
pub mod store;
pub mod utils;
pub mod visibility;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{ApiClient, ApiError, RequestSource};
pub use cache::TtlCache;
pub use models::{
    Notice, Notification, NotificationKind, Request, RequestDraft, RequestEdit, RequestStatus,
    RequestType, Role, User, UserRef,
};
pub use repository::{FetchError, RequestRepository};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use store::{
    LifecycleStore, NoticeLog, NotificationSink, StoreError, TracingSink, ValidationError,
};
pub use visibility::{can_approve, can_edit, visible_requests, RequestFilter, RequestSummary};
