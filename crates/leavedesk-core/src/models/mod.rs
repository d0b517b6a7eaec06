//! Data models for time-off tracking.
//!
//! - `Request`, `RequestStatus`, `RequestType`: the central entity
//! - `RequestDraft`, `RequestEdit`: inputs to create and edit operations
//! - `User`, `UserRef`, `Role`: people and their permissions
//! - `Notification`, `Notice`: fetched notifications and emitted notices
//!
//! Wire records (`RequestRecord`, `NotificationRecord`) mirror the remote
//! JSON with dates still as strings; `normalize` turns them into the typed
//! models.

pub mod notification;
pub mod request;
pub mod user;

pub use notification::{Notice, Notification, NotificationKind, NotificationRecord};
pub use request::{
    Request, RequestDraft, RequestEdit, RequestRecord, RequestStatus, RequestType, StatusChange,
};
pub use user::{Role, User, UserRef};
