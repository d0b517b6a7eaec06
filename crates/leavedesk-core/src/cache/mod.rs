//! In-memory caching with a fixed freshness window.
//!
//! This module provides the `TtlCache` used by the repository. Entries are
//! keyed by name (`"requests"`, `"notifications"`), stored as JSON values and
//! considered fresh for `DEFAULT_TTL_SECS` seconds unless configured
//! otherwise. Staleness is evaluated lazily on read; nothing expires in the
//! background.

pub mod ttl;

pub use ttl::{CacheHit, CachedData, TtlCache, DEFAULT_TTL_SECS};
