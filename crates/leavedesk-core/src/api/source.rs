use crate::models::{NotificationRecord, Request, RequestRecord, StatusChange};

use super::ApiError;

/// The remote data source behind the repository.
///
/// Every call is a single request/response round trip. Records come back in
/// wire form; normalization happens in the repository.
#[allow(async_fn_in_trait)]
pub trait RequestSource {
    /// `GET requests`
    async fn list_requests(&self) -> Result<Vec<RequestRecord>, ApiError>;

    /// `POST requests`
    async fn create_request(&self, request: &Request) -> Result<RequestRecord, ApiError>;

    /// `PATCH requests/{id}` with the full edited request
    async fn update_request(&self, request: &Request) -> Result<RequestRecord, ApiError>;

    /// `PATCH requests/{id}/status`
    async fn update_status(
        &self,
        id: &str,
        change: &StatusChange,
    ) -> Result<RequestRecord, ApiError>;

    /// `GET notifications`
    async fn list_notifications(&self) -> Result<Vec<NotificationRecord>, ApiError>;
}
