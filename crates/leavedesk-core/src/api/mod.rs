//! REST API client module for the time-off service.
//!
//! This module provides:
//! - `RequestSource`: the remote data source the repository fetches from
//! - `ApiClient`: its HTTP/JSON implementation over reqwest
//!
//! The service speaks camelCase JSON with ISO-8601 date strings. Requests
//! are authenticated with an optional bearer token supplied by the caller.

pub mod client;
pub mod error;
pub mod source;

pub use client::ApiClient;
pub use error::ApiError;
pub use source::RequestSource;
