use chrono::{DateTime, NaiveDate};

/// Parse a backend date. Accepts `YYYY-MM-DD`, RFC 3339 timestamps, and
/// anything whose first ten characters form a `YYYY-MM-DD` date.
pub fn parse_date(date: &str) -> Option<NaiveDate> {
    let date = date.trim();
    if let Ok(day) = NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        return Some(day);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(date) {
        return Some(dt.date_naive());
    }
    date.get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

/// Normalize a backend date to `YYYY-MM-DD`, returning the input unchanged
/// when it cannot be parsed
pub fn normalize_date(date: &str) -> String {
    parse_date(date)
        .map(|day| day.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| date.to_string())
}

/// Format an amount with two decimals and thousands separators, e.g. `-1,234.50`
pub fn format_currency(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}{}.{:02}", sign, grouped, cents % 100)
}

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
