//! API client for the time-off service REST API.
//!
//! This module provides the `ApiClient` struct for making authenticated
//! requests against the request and notification endpoints.

use std::time::Duration;

use reqwest::{header, Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::models::{NotificationRecord, Request, RequestRecord, StatusChange};

use super::{ApiError, RequestSource};

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// API client for the time-off service. Clones share one connection pool.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client for the service at `base_url`
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn auth_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        if let Some(ref token) = self.token {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| {
                    ApiError::InvalidResponse("bearer token is not a valid header value".into())
                })?;
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(
        response: reqwest::Response,
    ) -> Result<Option<reqwest::Response>, ApiError> {
        let status = response.status();
        match response_action(status) {
            ResponseAction::Accept => Ok(Some(response)),
            ResponseAction::Retry => Ok(None),
            ResponseAction::Fail => {
                let body = response.text().await.unwrap_or_default();
                Err(ApiError::from_status(status, &body))
            }
        }
    }

    /// Send a JSON request, retrying with exponential backoff while rate limited.
    async fn send<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.endpoint(path);
        let mut retries = 0;

        loop {
            let mut builder = self
                .client
                .request(method.clone(), &url)
                .headers(self.auth_headers()?);
            if let Some(body) = body {
                builder = builder.json(body);
            }

            let response = builder.send().await?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    debug!(method = %method, url = %url, "Response received");
                    return response.json().await.map_err(|e| {
                        ApiError::InvalidResponse(format!(
                            "Failed to parse JSON from {}: {}",
                            url, e
                        ))
                    });
                }
                None => {
                    retries += 1;
                    let Some(delay) = backoff_delay(retries) else {
                        return Err(ApiError::RateLimited);
                    };
                    warn!(
                        url = %url,
                        retry = retries,
                        backoff_ms = delay.as_millis() as u64,
                        "Rate limited, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send::<T, ()>(Method::GET, path, None).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResponseAction {
    Accept,
    Retry,
    Fail,
}

fn response_action(status: StatusCode) -> ResponseAction {
    if status.is_success() {
        ResponseAction::Accept
    } else if status == StatusCode::TOO_MANY_REQUESTS {
        ResponseAction::Retry
    } else {
        ResponseAction::Fail
    }
}

/// Wait before rate-limit retry number `retry` (1-based), doubling each time.
/// `None` once the retries are used up.
fn backoff_delay(retry: u32) -> Option<Duration> {
    if retry == 0 || retry > MAX_RATE_LIMIT_RETRIES {
        return None;
    }
    Some(Duration::from_millis(INITIAL_BACKOFF_MS << (retry - 1)))
}

impl RequestSource for ApiClient {
    async fn list_requests(&self) -> Result<Vec<RequestRecord>, ApiError> {
        self.get("requests").await
    }

    async fn create_request(&self, request: &Request) -> Result<RequestRecord, ApiError> {
        self.send(Method::POST, "requests", Some(request)).await
    }

    async fn update_request(&self, request: &Request) -> Result<RequestRecord, ApiError> {
        let path = format!("requests/{}", request.id);
        self.send(Method::PATCH, &path, Some(request)).await
    }

    async fn update_status(
        &self,
        id: &str,
        change: &StatusChange,
    ) -> Result<RequestRecord, ApiError> {
        let path = format!("requests/{}/status", id);
        self.send(Method::PATCH, &path, Some(change)).await
    }

    async fn list_notifications(&self) -> Result<Vec<NotificationRecord>, ApiError> {
        self.get("notifications").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let client = ApiClient::new("https://hr.example.com/api/").unwrap();
        assert_eq!(client.base_url(), "https://hr.example.com/api");
        assert_eq!(
            client.endpoint("/requests/r1/status"),
            "https://hr.example.com/api/requests/r1/status"
        );
    }

    #[test]
    fn test_auth_headers() {
        let client = ApiClient::new("http://localhost:3000").unwrap();
        let headers = client.auth_headers().unwrap();
        assert!(headers.get(header::AUTHORIZATION).is_none());

        let client = client.with_token("abc123".to_string());
        let headers = client.auth_headers().unwrap();
        assert_eq!(headers.get(header::AUTHORIZATION).unwrap(), "Bearer abc123");
    }

    #[test]
    fn test_invalid_token_is_rejected() {
        let mut client = ApiClient::new("http://localhost:3000").unwrap();
        client.set_token("bad\ntoken".to_string());
        assert!(client.auth_headers().is_err());
    }

    #[test]
    fn test_response_action() {
        assert_eq!(response_action(StatusCode::OK), ResponseAction::Accept);
        assert_eq!(response_action(StatusCode::CREATED), ResponseAction::Accept);
        assert_eq!(
            response_action(StatusCode::TOO_MANY_REQUESTS),
            ResponseAction::Retry
        );
        assert_eq!(response_action(StatusCode::CONFLICT), ResponseAction::Fail);
        assert_eq!(
            response_action(StatusCode::SERVICE_UNAVAILABLE),
            ResponseAction::Fail
        );
    }

    #[test]
    fn test_backoff_doubles_then_gives_up() {
        assert_eq!(backoff_delay(1), Some(Duration::from_millis(1000)));
        assert_eq!(backoff_delay(2), Some(Duration::from_millis(2000)));
        assert_eq!(backoff_delay(3), Some(Duration::from_millis(4000)));
        assert_eq!(backoff_delay(4), None);
        assert_eq!(backoff_delay(0), None);
    }
}
