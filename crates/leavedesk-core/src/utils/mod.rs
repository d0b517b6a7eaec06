//! Utility functions for date parsing and display formatting.

pub mod dates;
pub mod format;

pub use dates::{parse_clock_time, parse_wire_date, parse_wire_timestamp, DateParseError};
pub use format::{format_date_range, format_optional, truncate_string};
