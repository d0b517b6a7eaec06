use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use crate::models::{Request, RequestDraft, RequestStatus, RequestType, UserRef};
use crate::utils::parse_clock_time;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("End date {end} is before start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },

    #[error("Invalid time for {field}: '{value}' (expected HH:MM)")]
    InvalidTime { field: &'static str, value: String },

    #[error("No changes given")]
    EmptyEdit,
}

impl ValidationError {
    /// The offending field, when there is a single one
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ValidationError::MissingField(field) => Some(*field),
            ValidationError::EndBeforeStart { .. } => Some("endDate"),
            ValidationError::InvalidTime { field, .. } => Some(*field),
            ValidationError::EmptyEdit => None,
        }
    }
}

/// Draft fields after validation, trimmed and made consistent with the type
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ValidDraft {
    pub request_type: RequestType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub original_clock_in: Option<String>,
    pub original_clock_out: Option<String>,
    pub requested_clock_in: Option<String>,
    pub requested_clock_out: Option<String>,
}

impl ValidDraft {
    pub fn into_request(self, id: String, employee: UserRef, now: DateTime<Utc>) -> Request {
        Request {
            id,
            employee,
            request_type: self.request_type,
            start_date: self.start_date,
            end_date: self.end_date,
            reason: self.reason,
            status: RequestStatus::Pending,
            approved_by: None,
            rejection_reason: None,
            original_clock_in: self.original_clock_in,
            original_clock_out: self.original_clock_out,
            requested_clock_in: self.requested_clock_in,
            requested_clock_out: self.requested_clock_out,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite the editable fields of `request`; identity, owner, status
    /// and creation time are kept.
    pub fn apply_to(self, mut request: Request, now: DateTime<Utc>) -> Request {
        request.request_type = self.request_type;
        request.start_date = self.start_date;
        request.end_date = self.end_date;
        request.reason = self.reason;
        request.original_clock_in = self.original_clock_in;
        request.original_clock_out = self.original_clock_out;
        request.requested_clock_in = self.requested_clock_in;
        request.requested_clock_out = self.requested_clock_out;
        request.updated_at = now;
        request
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn clock_field(
    field: &'static str,
    value: &Option<String>,
    required: bool,
) -> Result<Option<String>, ValidationError> {
    match non_blank(value) {
        Some(v) => {
            parse_clock_time(field, &v).map_err(|_| ValidationError::InvalidTime {
                field,
                value: v.clone(),
            })?;
            Ok(Some(v))
        }
        None if required => Err(ValidationError::MissingField(field)),
        None => Ok(None),
    }
}

/// Check a draft in field order: employee, dates, reason, clock times.
pub(crate) fn validate(draft: &RequestDraft) -> Result<ValidDraft, ValidationError> {
    if draft.employee.id.trim().is_empty() {
        return Err(ValidationError::MissingField("employee"));
    }

    let start_date = draft
        .start_date
        .ok_or(ValidationError::MissingField("startDate"))?;
    let is_time_edit = draft.request_type == RequestType::TimeEdit;

    // A time edit covers exactly one day
    let end_date = if is_time_edit {
        start_date
    } else {
        let end = draft.end_date.ok_or(ValidationError::MissingField("endDate"))?;
        if end < start_date {
            return Err(ValidationError::EndBeforeStart {
                start: start_date,
                end,
            });
        }
        end
    };

    let reason = draft.reason.trim();
    if reason.is_empty() {
        return Err(ValidationError::MissingField("reason"));
    }

    let mut valid = ValidDraft {
        request_type: draft.request_type,
        start_date,
        end_date,
        reason: reason.to_string(),
        original_clock_in: None,
        original_clock_out: None,
        requested_clock_in: None,
        requested_clock_out: None,
    };

    if is_time_edit {
        valid.requested_clock_in =
            clock_field("requestedClockIn", &draft.requested_clock_in, true)?;
        valid.requested_clock_out =
            clock_field("requestedClockOut", &draft.requested_clock_out, true)?;
        valid.original_clock_in = clock_field("originalClockIn", &draft.original_clock_in, false)?;
        valid.original_clock_out =
            clock_field("originalClockOut", &draft.original_clock_out, false)?;
    }

    Ok(valid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::user_ref;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn leave() -> RequestDraft {
        RequestDraft::new(user_ref("e1"), RequestType::SickLeave, day(6), day(7), " flu ")
    }

    #[test]
    fn test_valid_leave_is_trimmed() {
        let valid = validate(&leave()).unwrap();
        assert_eq!(valid.reason, "flu");
        assert_eq!(valid.end_date, day(7));
    }

    #[test]
    fn test_missing_fields_in_order() {
        let mut draft = leave();
        draft.start_date = None;
        draft.reason = String::new();
        assert_eq!(validate(&draft), Err(ValidationError::MissingField("startDate")));

        let mut draft = leave();
        draft.end_date = None;
        assert_eq!(validate(&draft).unwrap_err().field(), Some("endDate"));

        let mut draft = leave();
        draft.reason = "   ".to_string();
        assert_eq!(validate(&draft), Err(ValidationError::MissingField("reason")));

        let mut draft = leave();
        draft.employee.id = String::new();
        assert_eq!(validate(&draft), Err(ValidationError::MissingField("employee")));
    }

    #[test]
    fn test_end_before_start() {
        let mut draft = leave();
        draft.end_date = Some(day(1));
        assert!(matches!(
            validate(&draft),
            Err(ValidationError::EndBeforeStart { .. })
        ));
    }

    #[test]
    fn test_time_edit_uses_single_day() {
        let mut draft =
            RequestDraft::time_edit(user_ref("e1"), day(6), "09:00", "17:00", "missed punch")
                .with_original_times("09:30", "17:00");
        draft.end_date = Some(day(20));

        let valid = validate(&draft).unwrap();
        assert_eq!(valid.end_date, day(6));
        assert_eq!(valid.original_clock_in.as_deref(), Some("09:30"));
    }

    #[test]
    fn test_time_edit_needs_requested_times() {
        let mut draft =
            RequestDraft::time_edit(user_ref("e1"), day(6), "09:00", "", "missed punch");
        assert_eq!(
            validate(&draft),
            Err(ValidationError::MissingField("requestedClockOut"))
        );

        draft.requested_clock_out = Some("5pm".to_string());
        assert_eq!(
            validate(&draft),
            Err(ValidationError::InvalidTime {
                field: "requestedClockOut",
                value: "5pm".to_string()
            })
        );
    }

    #[test]
    fn test_clock_fields_dropped_for_leave() {
        let mut draft = leave();
        draft.requested_clock_in = Some("09:00".to_string());
        let valid = validate(&draft).unwrap();
        assert_eq!(valid.requested_clock_in, None);
    }
}
