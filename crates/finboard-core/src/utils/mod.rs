//! Utility functions for date and amount formatting.

pub mod format;

pub use format::{format_currency, normalize_date, parse_date, truncate_string};
