use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::UserRef;
use crate::utils::dates::{parse_wire_date, parse_wire_timestamp, DateParseError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    PaidTimeOff,
    SickLeave,
    TimeEdit,
    Other,
}

impl RequestType {
    pub const ALL: [RequestType; 4] = [
        RequestType::PaidTimeOff,
        RequestType::SickLeave,
        RequestType::TimeEdit,
        RequestType::Other,
    ];

    /// Wire value as used by the remote API
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestType::PaidTimeOff => "paid_time_off",
            RequestType::SickLeave => "sick_leave",
            RequestType::TimeEdit => "time_edit",
            RequestType::Other => "other",
        }
    }

    /// Accepts wire values as well as their dashed spelling (`sick-leave`).
    pub fn from_str(s: &str) -> Option<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL.into_iter().find(|t| t.as_str() == normalized)
    }
}

impl std::fmt::Display for RequestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestType::PaidTimeOff => write!(f, "Paid Time Off"),
            RequestType::SickLeave => write!(f, "Sick Leave"),
            RequestType::TimeEdit => write!(f, "Time Edit"),
            RequestType::Other => write!(f, "Other"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(RequestStatus::Pending),
            "approved" => Some(RequestStatus::Approved),
            "rejected" => Some(RequestStatus::Rejected),
            _ => None,
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestStatus::Pending => write!(f, "Pending"),
            RequestStatus::Approved => write!(f, "Approved"),
            RequestStatus::Rejected => write!(f, "Rejected"),
        }
    }
}

/// A time-off request.
///
/// This is the typed, normalized form: dates are `NaiveDate`, timestamps are
/// UTC. It is also the shape persisted locally and sent to the remote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub id: String,
    pub employee: UserRef,
    #[serde(rename = "type")]
    pub request_type: RequestType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    #[serde(default)]
    pub status: RequestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<UserRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_clock_in: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_clock_out: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_clock_in: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_clock_out: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Request {
    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.employee.id == user_id
    }

    /// Number of calendar days covered, inclusive of both ends
    pub fn days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    /// True if the request's date range intersects `[from, to]`
    pub fn overlaps(&self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> bool {
        let after_from = from.map_or(true, |f| self.end_date >= f);
        let before_to = to.map_or(true, |t| self.start_date <= t);
        after_from && before_to
    }
}

/// Request as received from the remote, before date normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestRecord {
    pub id: String,
    pub employee: UserRef,
    #[serde(rename = "type")]
    pub request_type: RequestType,
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub status: RequestStatus,
    pub approved_by: Option<UserRef>,
    pub rejection_reason: Option<String>,
    pub original_clock_in: Option<String>,
    pub original_clock_out: Option<String>,
    pub requested_clock_in: Option<String>,
    pub requested_clock_out: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl RequestRecord {
    /// Parse the date-bearing string fields into date values.
    /// A missing `updatedAt` falls back to `createdAt`.
    pub fn normalize(self) -> Result<Request, DateParseError> {
        let start_date = parse_wire_date("startDate", &self.start_date)?;
        let end_date = parse_wire_date("endDate", &self.end_date)?;
        let created_at = parse_wire_timestamp("createdAt", &self.created_at)?;
        let updated_at = match self.updated_at.as_deref() {
            Some(s) => parse_wire_timestamp("updatedAt", s)?,
            None => created_at,
        };

        Ok(Request {
            id: self.id,
            employee: self.employee,
            request_type: self.request_type,
            start_date,
            end_date,
            reason: self.reason,
            status: self.status,
            approved_by: self.approved_by,
            rejection_reason: self.rejection_reason,
            original_clock_in: self.original_clock_in,
            original_clock_out: self.original_clock_out,
            requested_clock_in: self.requested_clock_in,
            requested_clock_out: self.requested_clock_out,
            created_at,
            updated_at,
        })
    }
}

/// Input to `LifecycleStore::add_request`.
///
/// Dates are optional so a half-filled form can be handed over as-is;
/// validation reports which field is missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDraft {
    pub employee: UserRef,
    #[serde(rename = "type")]
    pub request_type: RequestType,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub reason: String,
    pub original_clock_in: Option<String>,
    pub original_clock_out: Option<String>,
    pub requested_clock_in: Option<String>,
    pub requested_clock_out: Option<String>,
}

impl RequestDraft {
    pub fn new(
        employee: UserRef,
        request_type: RequestType,
        start_date: NaiveDate,
        end_date: NaiveDate,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            employee,
            request_type,
            start_date: Some(start_date),
            end_date: Some(end_date),
            reason: reason.into(),
            original_clock_in: None,
            original_clock_out: None,
            requested_clock_in: None,
            requested_clock_out: None,
        }
    }

    /// A time correction for a single day
    pub fn time_edit(
        employee: UserRef,
        date: NaiveDate,
        requested_clock_in: impl Into<String>,
        requested_clock_out: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            employee,
            request_type: RequestType::TimeEdit,
            start_date: Some(date),
            end_date: Some(date),
            reason: reason.into(),
            original_clock_in: None,
            original_clock_out: None,
            requested_clock_in: Some(requested_clock_in.into()),
            requested_clock_out: Some(requested_clock_out.into()),
        }
    }

    pub fn with_original_times(
        mut self,
        clock_in: impl Into<String>,
        clock_out: impl Into<String>,
    ) -> Self {
        self.original_clock_in = Some(clock_in.into());
        self.original_clock_out = Some(clock_out.into());
        self
    }

    /// Draft holding an existing request's editable fields
    pub fn from_request(request: &Request) -> Self {
        Self {
            employee: request.employee.clone(),
            request_type: request.request_type,
            start_date: Some(request.start_date),
            end_date: Some(request.end_date),
            reason: request.reason.clone(),
            original_clock_in: request.original_clock_in.clone(),
            original_clock_out: request.original_clock_out.clone(),
            requested_clock_in: request.requested_clock_in.clone(),
            requested_clock_out: request.requested_clock_out.clone(),
        }
    }
}

/// Field edits to a pending request. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestEdit {
    pub request_type: Option<RequestType>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub reason: Option<String>,
    pub original_clock_in: Option<String>,
    pub original_clock_out: Option<String>,
    pub requested_clock_in: Option<String>,
    pub requested_clock_out: Option<String>,
}

impl RequestEdit {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overlay these edits on a draft of the current request
    pub fn apply(self, mut draft: RequestDraft) -> RequestDraft {
        if let Some(t) = self.request_type {
            draft.request_type = t;
        }
        if let Some(d) = self.start_date {
            draft.start_date = Some(d);
        }
        if let Some(d) = self.end_date {
            draft.end_date = Some(d);
        }
        if let Some(r) = self.reason {
            draft.reason = r;
        }
        if let Some(v) = self.original_clock_in {
            draft.original_clock_in = Some(v);
        }
        if let Some(v) = self.original_clock_out {
            draft.original_clock_out = Some(v);
        }
        if let Some(v) = self.requested_clock_in {
            draft.requested_clock_in = Some(v);
        }
        if let Some(v) = self.requested_clock_out {
            draft.requested_clock_out = Some(v);
        }
        draft
    }
}

/// Body of `PATCH requests/{id}/status`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub status: RequestStatus,
    pub approved_by: UserRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    pub updated_at: DateTime<Utc>,
}
