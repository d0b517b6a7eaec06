//! Plain-text rendering of requests and notices for the terminal.

use leavedesk_core::utils::{format_date_range, format_optional, truncate_string};
use leavedesk_core::{Notice, NotificationKind, NotificationSink, Request, RequestSummary};

/// Width of the shortened id column; ids are UUIDs, 8 chars are unique in practice
const ID_WIDTH: usize = 8;

/// Maximum characters of the reason shown in list rows
const REASON_WIDTH: usize = 32;

/// Prints store notices to stderr as they happen
pub struct ConsoleSink;

impl NotificationSink for ConsoleSink {
    fn add_notification(&mut self, notice: Notice) {
        let marker = match notice.kind {
            NotificationKind::Success => "ok",
            NotificationKind::Warning => "warning",
            NotificationKind::Error => "error",
            NotificationKind::Info => "info",
        };
        eprintln!("[{}] {}", marker, notice.message);
    }
}

pub fn short_id(id: &str) -> String {
    id.chars().take(ID_WIDTH).collect()
}

pub fn request_row(request: &Request) -> String {
    format!(
        "{:<8}  {:<18}  {:<13}  {:<28}  {:<8}  {}",
        short_id(&request.id),
        truncate_string(&request.employee.name, 18),
        request.request_type.to_string(),
        format_date_range(request.start_date, request.end_date),
        request.status.to_string(),
        truncate_string(&request.reason, REASON_WIDTH),
    )
}

pub fn request_table(requests: &[&Request]) -> String {
    let mut out = format!(
        "{:<8}  {:<18}  {:<13}  {:<28}  {:<8}  {}\n",
        "ID", "EMPLOYEE", "TYPE", "DATES", "STATUS", "REASON"
    );
    for request in requests {
        out.push_str(&request_row(request));
        out.push('\n');
    }
    out
}

pub fn request_detail(request: &Request) -> String {
    let mut lines = vec![
        format!("ID:        {}", request.id),
        format!("Employee:  {} ({})", request.employee.name, request.employee.id),
        format!("Type:      {}", request.request_type),
        format!(
            "Dates:     {} ({} day{})",
            format_date_range(request.start_date, request.end_date),
            request.days(),
            if request.days() == 1 { "" } else { "s" }
        ),
        format!("Status:    {}", request.status),
        format!("Reason:    {}", request.reason),
    ];
    if request.requested_clock_in.is_some() || request.requested_clock_out.is_some() {
        lines.push(format!(
            "Original:  {} - {}",
            format_optional(&request.original_clock_in, "?"),
            format_optional(&request.original_clock_out, "?")
        ));
        lines.push(format!(
            "Requested: {} - {}",
            format_optional(&request.requested_clock_in, "?"),
            format_optional(&request.requested_clock_out, "?")
        ));
    }
    if let Some(ref reviewer) = request.approved_by {
        lines.push(format!("Reviewer:  {}", reviewer.name));
    }
    if let Some(ref reason) = request.rejection_reason {
        lines.push(format!("Rejected:  {}", reason));
    }
    lines.push(format!(
        "Created:   {}",
        request.created_at.format("%Y-%m-%d %H:%M UTC")
    ));
    lines.push(format!(
        "Updated:   {}",
        request.updated_at.format("%Y-%m-%d %H:%M UTC")
    ));
    lines.join("\n")
}

pub fn summary_line(summary: &RequestSummary) -> String {
    format!(
        "{} requests: {} pending, {} approved, {} rejected",
        summary.total, summary.pending, summary.approved, summary.rejected
    )
}
