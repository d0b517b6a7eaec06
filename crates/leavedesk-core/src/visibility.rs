//! Role-based visibility and capability checks.
//!
//! Every view narrows the request collection through [`visible_requests`]
//! before rendering, and asks [`can_approve`] / [`can_edit`] before offering
//! an action. Nothing here has side effects.

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{Request, RequestStatus, RequestType, Role, User};

/// Requests `viewer` may see: everything for managers and admins, only their
/// own for employees.
pub fn visible_requests<'a>(all: &'a [Request], viewer: &User) -> Vec<&'a Request> {
    if viewer.role.is_reviewer() {
        all.iter().collect()
    } else {
        all.iter().filter(|r| r.is_owned_by(&viewer.id)).collect()
    }
}

/// A reviewer may decide a pending request that is not their own.
pub fn can_approve(viewer: &User, request: &Request) -> bool {
    viewer.role.is_reviewer() && request.is_pending() && !request.is_owned_by(&viewer.id)
}

/// Pending requests can be edited by their owner, or by an admin.
pub fn can_edit(viewer: &User, request: &Request) -> bool {
    request.is_pending() && (request.is_owned_by(&viewer.id) || viewer.role == Role::Admin)
}

/// Downstream filters applied to an already role-filtered list.
#[derive(Debug, Clone, Default)]
pub struct RequestFilter {
    pub status: Option<RequestStatus>,
    pub request_type: Option<RequestType>,
    /// Keep requests ending on or after this date
    pub from: Option<NaiveDate>,
    /// Keep requests starting on or before this date
    pub to: Option<NaiveDate>,
    /// Case-insensitive match on reason or employee name
    pub search: Option<String>,
}

impl RequestFilter {
    pub fn matches(&self, request: &Request) -> bool {
        if self.status.is_some_and(|s| s != request.status) {
            return false;
        }
        if self.request_type.is_some_and(|t| t != request.request_type) {
            return false;
        }
        if !request.overlaps(self.from, self.to) {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => {
                let term = term.to_lowercase();
                request.reason.to_lowercase().contains(&term)
                    || request.employee.name.to_lowercase().contains(&term)
            }
            _ => true,
        }
    }

    pub fn apply<'a>(&self, requests: Vec<&'a Request>) -> Vec<&'a Request> {
        requests.into_iter().filter(|r| self.matches(r)).collect()
    }
}

/// Per-status counts for dashboard tiles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RequestSummary {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
}

impl RequestSummary {
    pub fn from_requests(requests: &[&Request]) -> Self {
        requests.iter().fold(Self::default(), |mut acc, r| {
            acc.total += 1;
            match r.status {
                RequestStatus::Pending => acc.pending += 1,
                RequestStatus::Approved => acc.approved += 1,
                RequestStatus::Rejected => acc.rejected += 1,
            }
            acc
        })
    }
}
