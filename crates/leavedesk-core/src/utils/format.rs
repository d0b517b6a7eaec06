use chrono::NaiveDate;

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format an optional string, returning a default if None
pub fn format_optional(value: &Option<String>, default: &str) -> String {
    value.as_deref().unwrap_or(default).to_string()
}

/// Format a request's date range for display.
/// Single-day ranges show one date; ranges within a year drop the first year.
pub fn format_date_range(start: NaiveDate, end: NaiveDate) -> String {
    if start == end {
        start.format("%b %d, %Y").to_string()
    } else if start.format("%Y").to_string() == end.format("%Y").to_string() {
        format!("{} - {}", start.format("%b %d"), end.format("%b %d, %Y"))
    } else {
        format!("{} - {}", start.format("%b %d, %Y"), end.format("%b %d, %Y"))
    }
}
