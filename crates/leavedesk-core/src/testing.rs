//! In-memory stand-in for the remote service, shared by unit tests.

use std::sync::Mutex;

use chrono::{NaiveDate, TimeZone, Utc};

use crate::api::{ApiError, RequestSource};
use crate::models::{
    NotificationRecord, Request, RequestRecord, RequestStatus, RequestType, StatusChange, UserRef,
};

#[derive(Default)]
struct FakeState {
    requests: Vec<RequestRecord>,
    notifications: Vec<NotificationRecord>,
    offline: bool,
    list_calls: usize,
    notification_calls: usize,
    write_calls: usize,
    status_echo: Option<fn(&mut RequestRecord)>,
}

/// Remote that keeps records in memory, counts calls and can be switched offline.
#[derive(Default)]
pub(crate) struct FakeSource {
    state: Mutex<FakeState>,
}

fn to_record(request: &Request) -> RequestRecord {
    let value = serde_json::to_value(request).unwrap();
    serde_json::from_value(value).unwrap()
}

fn offline_error() -> ApiError {
    ApiError::ServerError("service unavailable".to_string())
}

impl FakeSource {
    pub fn with_requests(requests: Vec<Request>) -> Self {
        let source = Self::default();
        for request in requests {
            source.insert(request);
        }
        source
    }

    pub fn insert(&self, request: Request) {
        self.state.lock().unwrap().requests.push(to_record(&request));
    }

    pub fn insert_raw(&self, value: serde_json::Value) {
        let record = serde_json::from_value(value).unwrap();
        self.state.lock().unwrap().requests.push(record);
    }

    pub fn push_notification(&self, id: &str, message: &str) {
        self.state.lock().unwrap().notifications.push(NotificationRecord {
            id: id.to_string(),
            kind: Default::default(),
            message: message.to_string(),
            created_at: "2024-05-01T08:00:00Z".to_string(),
            read: false,
        });
    }

    /// Rewrite the record returned by `update_status`; the stored record is untouched
    pub fn set_status_echo(&self, echo: fn(&mut RequestRecord)) {
        self.state.lock().unwrap().status_echo = Some(echo);
    }

    pub fn set_offline(&self, offline: bool) {
        self.state.lock().unwrap().offline = offline;
    }

    pub fn list_calls(&self) -> usize {
        self.state.lock().unwrap().list_calls
    }

    pub fn notification_calls(&self) -> usize {
        self.state.lock().unwrap().notification_calls
    }

    pub fn write_calls(&self) -> usize {
        self.state.lock().unwrap().write_calls
    }

    pub fn record(&self, id: &str) -> Option<RequestRecord> {
        let state = self.state.lock().unwrap();
        state.requests.iter().find(|r| r.id == id).cloned()
    }
}

impl RequestSource for FakeSource {
    async fn list_requests(&self) -> Result<Vec<RequestRecord>, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.list_calls += 1;
        if state.offline {
            return Err(offline_error());
        }
        Ok(state.requests.clone())
    }

    async fn create_request(&self, request: &Request) -> Result<RequestRecord, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.write_calls += 1;
        if state.offline {
            return Err(offline_error());
        }
        let record = to_record(request);
        state.requests.push(record.clone());
        Ok(record)
    }

    async fn update_request(&self, request: &Request) -> Result<RequestRecord, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.write_calls += 1;
        if state.offline {
            return Err(offline_error());
        }
        let record = to_record(request);
        let slot = state
            .requests
            .iter_mut()
            .find(|r| r.id == request.id)
            .ok_or_else(|| ApiError::NotFound(request.id.clone()))?;
        *slot = record.clone();
        Ok(record)
    }

    async fn update_status(
        &self,
        id: &str,
        change: &StatusChange,
    ) -> Result<RequestRecord, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.write_calls += 1;
        if state.offline {
            return Err(offline_error());
        }
        let echo_hook = state.status_echo;
        let slot = state
            .requests
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| ApiError::NotFound(id.to_string()))?;
        if slot.status.is_terminal() {
            return Err(ApiError::Conflict(format!("{} is already {}", id, slot.status.as_str())));
        }
        slot.status = change.status;
        slot.approved_by = Some(change.approved_by.clone());
        slot.rejection_reason = change.rejection_reason.clone();
        slot.updated_at = Some(change.updated_at.to_rfc3339());
        let mut echo = slot.clone();
        if let Some(rewrite) = echo_hook {
            rewrite(&mut echo);
        }
        Ok(echo)
    }

    async fn list_notifications(&self) -> Result<Vec<NotificationRecord>, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.notification_calls += 1;
        if state.offline {
            return Err(offline_error());
        }
        Ok(state.notifications.clone())
    }
}

pub(crate) fn user_ref(id: &str) -> UserRef {
    UserRef {
        id: id.to_string(),
        name: format!("User {}", id),
    }
}

/// A pending request owned by `employee_id`, dated May 2024
pub(crate) fn sample_request(id: &str, employee_id: &str, request_type: RequestType) -> Request {
    let created = Utc.with_ymd_and_hms(2024, 4, 20, 9, 0, 0).unwrap();
    Request {
        id: id.to_string(),
        employee: user_ref(employee_id),
        request_type,
        start_date: NaiveDate::from_ymd_opt(2024, 5, 6).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2024, 5, 8).unwrap(),
        reason: format!("reason for {}", id),
        status: RequestStatus::Pending,
        approved_by: None,
        rejection_reason: None,
        original_clock_in: None,
        original_clock_out: None,
        requested_clock_in: None,
        requested_clock_out: None,
        created_at: created,
        updated_at: created,
    }
}
