//! Request repository: remote fetches mediated by the TTL cache.
//!
//! Reads are served from the cache while fresh. Once stale or missing, the
//! remote is asked; if that fails, whatever the cache still holds is
//! returned as a degraded result. Only a miss with a failed fetch surfaces
//! as a `FetchError`.
//!
//! Mutations are forwarded to the remote as-is and never touch the cache.
//! Invalidating after a mutation is up to the caller.
//!
//! Give the cache a backing store (`TtlCache::with_backing`) to keep entries
//! fresh across processes.

use chrono::Duration;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::api::{ApiError, RequestSource};
use crate::cache::TtlCache;
use crate::models::{Notification, NotificationRecord, Request, RequestRecord, StatusChange};

/// Cache key for the request collection
pub const REQUESTS_KEY: &str = "requests";

/// Cache key for the notification collection
pub const NOTIFICATIONS_KEY: &str = "notifications";

/// A remote call failed and no cached data could stand in for it.
#[derive(Error, Debug)]
#[error("Failed to fetch {key}: {source}")]
pub struct FetchError {
    pub key: &'static str,
    #[source]
    pub source: ApiError,
}

pub struct RequestRepository<S> {
    source: S,
    cache: TtlCache,
    degraded: bool,
}

impl<S: RequestSource> RequestRepository<S> {
    pub fn new(source: S, ttl: Duration) -> Self {
        Self::with_cache(source, TtlCache::new(ttl))
    }

    pub fn with_cache(source: S, cache: TtlCache) -> Self {
        Self {
            source,
            cache,
            degraded: false,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// True when the last read fell back to stale data
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub async fn fetch_requests(&mut self) -> Result<Vec<Request>, FetchError> {
        if let Some(data) = self.fresh(REQUESTS_KEY) {
            return Ok(data);
        }
        let fetched = self
            .source
            .list_requests()
            .await
            .and_then(|records| normalize_all(records, RequestRecord::normalize));
        self.settle(REQUESTS_KEY, fetched)
    }

    pub async fn fetch_notifications(&mut self) -> Result<Vec<Notification>, FetchError> {
        if let Some(data) = self.fresh(NOTIFICATIONS_KEY) {
            return Ok(data);
        }
        let fetched = self
            .source
            .list_notifications()
            .await
            .and_then(|records| normalize_all(records, NotificationRecord::normalize));
        self.settle(NOTIFICATIONS_KEY, fetched)
    }

    /// Drop the cached request collection and fetch it again.
    pub async fn force_refresh(&mut self) -> Result<Vec<Request>, FetchError> {
        self.cache.invalidate(Some(&[REQUESTS_KEY][..]));
        self.fetch_requests().await
    }

    /// Remove the given cache keys, or everything when `keys` is `None`.
    pub fn invalidate(&mut self, keys: Option<&[&str]>) {
        self.cache.invalidate(keys);
    }

    pub fn requests_age(&self) -> Option<String> {
        self.cache.age_display(REQUESTS_KEY)
    }

    pub async fn create(&self, request: &Request) -> Result<Request, FetchError> {
        let result = self.source.create_request(request).await;
        Self::ingest(result)
    }

    pub async fn update(&self, request: &Request) -> Result<Request, FetchError> {
        let result = self.source.update_request(request).await;
        Self::ingest(result)
    }

    /// Send a status change. The echo must be the same request in the new
    /// status; reviewer and reason it leaves out are filled from `change`.
    pub async fn update_status(
        &self,
        id: &str,
        change: &StatusChange,
    ) -> Result<Request, FetchError> {
        let result = self.source.update_status(id, change).await;
        let mut updated = Self::ingest(result)?;

        if updated.id != id || updated.status != change.status {
            return Err(FetchError {
                key: REQUESTS_KEY,
                source: ApiError::InvalidResponse(format!(
                    "status update for {} to {} came back as {} {}",
                    id,
                    change.status.as_str(),
                    updated.id,
                    updated.status.as_str()
                )),
            });
        }
        if updated.approved_by.is_none() {
            updated.approved_by = Some(change.approved_by.clone());
        }
        if updated.rejection_reason.is_none() {
            updated.rejection_reason = change.rejection_reason.clone();
        }
        Ok(updated)
    }

    fn ingest(result: Result<RequestRecord, ApiError>) -> Result<Request, FetchError> {
        result
            .and_then(|record| record.normalize().map_err(ApiError::from))
            .map_err(|source| FetchError {
                key: REQUESTS_KEY,
                source,
            })
    }

    fn fresh<T: DeserializeOwned>(&mut self, key: &'static str) -> Option<T> {
        let hit = self.cache.get::<T>(key)?;
        if hit.is_fresh {
            debug!(cache = key, age_secs = hit.age_seconds, "Serving fresh cache entry");
            self.degraded = false;
            Some(hit.data)
        } else {
            debug!(cache = key, age_secs = hit.age_seconds, "Cache entry stale, refetching");
            None
        }
    }

    /// Store a successful fetch, or fall back to any cached entry on failure.
    fn settle<T>(
        &mut self,
        key: &'static str,
        fetched: Result<T, ApiError>,
    ) -> Result<T, FetchError>
    where
        T: Serialize + DeserializeOwned,
    {
        match fetched {
            Ok(data) => {
                if let Err(e) = self.cache.set(key, &data) {
                    warn!(cache = key, error = %e, "Failed to cache fetched data");
                }
                self.degraded = false;
                Ok(data)
            }
            Err(source) => match self.cache.get::<T>(key) {
                Some(hit) => {
                    warn!(
                        cache = key,
                        age_secs = hit.age_seconds,
                        error = %source,
                        "Fetch failed, serving stale cache entry"
                    );
                    self.degraded = true;
                    Ok(hit.data)
                }
                None => Err(FetchError { key, source }),
            },
        }
    }
}

fn normalize_all<R, T, E>(
    records: Vec<R>,
    normalize: fn(R) -> Result<T, E>,
) -> Result<Vec<T>, ApiError>
where
    ApiError: From<E>,
{
    records
        .into_iter()
        .map(|r| normalize(r).map_err(ApiError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RequestStatus, RequestType};
    use crate::storage::MemoryStore;
    use crate::testing::{sample_request, user_ref, FakeSource};
    use chrono::Utc;

    fn repo_with(requests: Vec<Request>) -> RequestRepository<FakeSource> {
        RequestRepository::new(FakeSource::with_requests(requests), Duration::seconds(30))
    }

    fn repo_backed_by(
        requests: Vec<Request>,
        store: &MemoryStore,
    ) -> RequestRepository<FakeSource> {
        let cache = TtlCache::with_backing(Duration::seconds(30), Box::new(store.clone()));
        RequestRepository::with_cache(FakeSource::with_requests(requests), cache)
    }

    fn rejection(reason: &str) -> StatusChange {
        StatusChange {
            status: RequestStatus::Rejected,
            approved_by: user_ref("m1"),
            rejection_reason: Some(reason.to_string()),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_fresh_cache_skips_remote() {
        let mut repo = repo_with(vec![sample_request("r1", "e1", RequestType::SickLeave)]);
        assert_eq!(repo.requests_age(), None);

        let first = repo.fetch_requests().await.unwrap();
        let second = repo.fetch_requests().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(repo.source().list_calls(), 1);
        assert_eq!(repo.requests_age().as_deref(), Some("just now"));
    }

    #[tokio::test]
    async fn test_stale_cache_refetches() {
        let mut repo = repo_with(vec![sample_request("r1", "e1", RequestType::SickLeave)]);
        repo.fetch_requests().await.unwrap();

        let old = Utc::now() - Duration::seconds(31);
        let cached = repo.cache.get::<Vec<Request>>(REQUESTS_KEY).unwrap().data;
        repo.cache.set_at(REQUESTS_KEY, &cached, old).unwrap();

        repo.source().insert(sample_request("r2", "e2", RequestType::Other));
        let requests = repo.fetch_requests().await.unwrap();

        assert_eq!(requests.len(), 2);
        assert_eq!(repo.source().list_calls(), 2);
    }

    #[tokio::test]
    async fn test_stale_fallback_when_offline() {
        let mut repo = repo_with(vec![sample_request("r1", "e1", RequestType::SickLeave)]);
        repo.fetch_requests().await.unwrap();

        let old = Utc::now() - Duration::minutes(10);
        let cached = repo.cache.get::<Vec<Request>>(REQUESTS_KEY).unwrap().data;
        repo.cache.set_at(REQUESTS_KEY, &cached, old).unwrap();
        repo.source().set_offline(true);

        let requests = repo.fetch_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(repo.is_degraded());
        assert_eq!(repo.source().list_calls(), 2);
    }

    #[tokio::test]
    async fn test_fetch_error_without_cache() {
        let mut repo = repo_with(Vec::new());
        repo.source().set_offline(true);

        let err = repo.fetch_requests().await.unwrap_err();
        assert_eq!(err.key, REQUESTS_KEY);
        assert!(matches!(err.source, ApiError::ServerError(_)));
    }

    #[tokio::test]
    async fn test_force_refresh_bypasses_fresh_cache() {
        let mut repo = repo_with(vec![sample_request("r1", "e1", RequestType::SickLeave)]);
        repo.fetch_requests().await.unwrap();

        repo.source().insert(sample_request("r2", "e1", RequestType::PaidTimeOff));
        assert_eq!(repo.fetch_requests().await.unwrap().len(), 1);

        let refreshed = repo.force_refresh().await.unwrap();
        assert_eq!(refreshed.len(), 2);
        assert_eq!(repo.source().list_calls(), 2);
    }

    #[tokio::test]
    async fn test_notifications_cached_independently() {
        let mut repo = repo_with(Vec::new());
        repo.source().push_notification("n1", "Your request was approved");

        let notifications = repo.fetch_notifications().await.unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].message, "Your request was approved");

        repo.invalidate(Some(&[REQUESTS_KEY][..]));
        repo.fetch_notifications().await.unwrap();
        assert_eq!(repo.source().notification_calls(), 1);

        repo.invalidate(None);
        repo.fetch_notifications().await.unwrap();
        assert_eq!(repo.source().notification_calls(), 2);
    }

    #[tokio::test]
    async fn test_malformed_record_is_invalid_response() {
        let mut repo = repo_with(Vec::new());
        repo.source().insert_raw(serde_json::json!({
            "id": "bad",
            "employee": {"id": "e1", "name": "Erin"},
            "type": "other",
            "startDate": "someday",
            "endDate": "2024-05-01",
            "reason": "x",
            "createdAt": "2024-05-01T00:00:00Z"
        }));

        let err = repo.fetch_requests().await.unwrap_err();
        assert!(matches!(err.source, ApiError::InvalidResponse(msg) if msg.contains("startDate")));
    }

    #[tokio::test]
    async fn test_second_session_hits_shared_cache() {
        let shared = MemoryStore::new();
        let seed = vec![sample_request("r1", "e1", RequestType::SickLeave)];
        let mut first = repo_backed_by(seed, &shared);
        let fetched = first.fetch_requests().await.unwrap();
        assert_eq!(first.source().list_calls(), 1);

        let mut second = repo_backed_by(Vec::new(), &shared);
        second.source().set_offline(true);
        let served = second.fetch_requests().await.unwrap();

        assert_eq!(served, fetched);
        assert_eq!(second.source().list_calls(), 0);
        assert!(!second.is_degraded());
    }

    #[tokio::test]
    async fn test_second_session_falls_back_to_stale_shared_entry() {
        let shared = MemoryStore::new();
        let old = Utc::now() - Duration::minutes(5);
        let mut seed = TtlCache::with_backing(Duration::seconds(30), Box::new(shared.clone()));
        seed.set_at(REQUESTS_KEY, &vec![sample_request("r1", "e1", RequestType::Other)], old)
            .unwrap();

        let mut repo = repo_backed_by(Vec::new(), &shared);
        repo.source().set_offline(true);
        let served = repo.fetch_requests().await.unwrap();

        assert_eq!(served.len(), 1);
        assert!(repo.is_degraded());
        assert_eq!(repo.source().list_calls(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_reaches_other_sessions() {
        let shared = MemoryStore::new();
        let mut first =
            repo_backed_by(vec![sample_request("r1", "e1", RequestType::Other)], &shared);
        first.fetch_requests().await.unwrap();
        first.invalidate(Some(&[REQUESTS_KEY][..]));

        let mut second =
            repo_backed_by(vec![sample_request("r2", "e2", RequestType::Other)], &shared);
        let served = second.fetch_requests().await.unwrap();
        assert_eq!(served[0].id, "r2");
        assert_eq!(second.source().list_calls(), 1);
    }

    #[tokio::test]
    async fn test_terse_status_echo_is_completed() {
        let repo = repo_with(vec![sample_request("r1", "e1", RequestType::SickLeave)]);
        repo.source().set_status_echo(|record| {
            record.approved_by = None;
            record.rejection_reason = None;
        });

        let updated = repo.update_status("r1", &rejection("too late")).await.unwrap();
        assert_eq!(updated.status, RequestStatus::Rejected);
        assert_eq!(updated.rejection_reason.as_deref(), Some("too late"));
        assert_eq!(updated.approved_by, Some(user_ref("m1")));
    }

    #[tokio::test]
    async fn test_status_echo_mismatch_is_invalid_response() {
        let repo = repo_with(vec![
            sample_request("r1", "e1", RequestType::SickLeave),
            sample_request("r2", "e1", RequestType::SickLeave),
        ]);
        repo.source().set_status_echo(|record| record.status = RequestStatus::Pending);

        let err = repo.update_status("r1", &rejection("too late")).await.unwrap_err();
        assert!(matches!(err.source, ApiError::InvalidResponse(msg) if msg.contains("r1")));

        repo.source().set_status_echo(|record| record.id = "r9".to_string());
        let err = repo.update_status("r2", &rejection("too late")).await.unwrap_err();
        assert!(matches!(err.source, ApiError::InvalidResponse(_)));
    }
}
