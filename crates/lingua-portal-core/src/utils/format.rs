use chrono::{DateTime, Utc};

/// Date format used across the portal, e.g. `01-Jun-2025`
const DATE_FORMAT: &str = "%d-%b-%Y";

/// Format a UNIX timestamp (seconds) as `dd-Mon-yyyy`
pub fn format_unix_date(timestamp: i64) -> String {
    DateTime::<Utc>::from_timestamp(timestamp, 0)
        .map(|dt| dt.format(DATE_FORMAT).to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

/// Format an RFC 3339 timestamp as `dd-Mon-yyyy`, returning the input
/// unchanged when it does not parse
pub fn format_iso_date(value: &str) -> String {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc).format(DATE_FORMAT).to_string())
        .unwrap_or_else(|_| value.to_string())
}

/// Format an amount in minor units with its currency, e.g. `150.00 MYR`
pub fn format_amount(minor_units: i64, currency: &str) -> String {
    let sign = if minor_units < 0 { "-" } else { "" };
    let abs = minor_units.unsigned_abs();
    format!("{}{}.{:02} {}", sign, abs / 100, abs % 100, currency.to_uppercase())
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_unix_date() {
        assert_eq!(format_unix_date(1735689600), "01-Jan-2025");
        assert_eq!(format_unix_date(0), "01-Jan-1970");
    }

    #[test]
    fn test_format_iso_date() {
        assert_eq!(format_iso_date("2025-06-01T08:30:00Z"), "01-Jun-2025");
        assert_eq!(format_iso_date("2025-06-01T23:30:00-02:00"), "02-Jun-2025");
        assert_eq!(format_iso_date("yesterday"), "yesterday");
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(15000, "myr"), "150.00 MYR");
        assert_eq!(format_amount(5, "usd"), "0.05 USD");
        assert_eq!(format_amount(-1250, "myr"), "-12.50 MYR");
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hello", 10), "Hello");
        assert_eq!(truncate_string("Hello World", 8), "Hello...");
        assert_eq!(truncate_string("Hello", 2), "He");
    }
}
