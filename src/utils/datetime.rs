//! Timestamp normalization.
//!
//! Source timestamps are compact `YYYYMMDDHHMMSS±zzzz` strings with
//! arbitrary precision truncation. Target timestamps are ISO 8601 with the
//! precision the source actually carried. A time-of-day without a UTC
//! offset cannot be represented faithfully in the target format, which
//! requires an offset alongside any time; such values are truncated to
//! date precision rather than given an invented zone.

use chrono::{FixedOffset, NaiveDate, NaiveDateTime};

/// Normalize a compact source timestamp into a target-format timestamp.
/// Returns `None` for values that do not parse at any precision.
pub fn normalize_timestamp(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let (digits, offset) = split_offset(raw);
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    // An offset is only meaningful alongside a time of day.
    if offset.is_some() && digits.len() < 12 {
        return None;
    }

    match digits.len() {
        4 => {
            // Year precision. Validated by constructing an actual date.
            NaiveDate::parse_from_str(&format!("{digits}0101"), "%Y%m%d").ok()?;
            Some(digits.to_string())
        }
        6 => {
            NaiveDate::parse_from_str(&format!("{digits}01"), "%Y%m%d").ok()?;
            Some(format!("{}-{}", &digits[..4], &digits[4..6]))
        }
        8 => {
            NaiveDate::parse_from_str(digits, "%Y%m%d").ok()?;
            Some(format!(
                "{}-{}-{}",
                &digits[..4],
                &digits[4..6],
                &digits[6..8]
            ))
        }
        12 | 14 => {
            let padded = if digits.len() == 12 {
                format!("{digits}00")
            } else {
                digits.to_string()
            };
            let naive = NaiveDateTime::parse_from_str(&padded, "%Y%m%d%H%M%S").ok()?;
            match offset {
                Some(offset) => {
                    let offset = parse_offset(offset)?;
                    let dt = naive.and_local_timezone(offset).single()?;
                    Some(dt.format("%Y-%m-%dT%H:%M:%S%:z").to_string())
                }
                // No offset: drop the time rather than invent a zone.
                None => Some(naive.format("%Y-%m-%d").to_string()),
            }
        }
        _ => None,
    }
}

fn split_offset(raw: &str) -> (&str, Option<&str>) {
    if let Some(idx) = raw.find(['+', '-']) {
        (&raw[..idx], Some(&raw[idx..]))
    } else {
        (raw, None)
    }
}

fn parse_offset(raw: &str) -> Option<FixedOffset> {
    let (sign, body) = raw.split_at(1);
    if body.len() != 4 || !body.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = body[..2].parse().ok()?;
    let minutes: i32 = body[2..].parse().ok()?;
    let seconds = hours * 3600 + minutes * 60;
    match sign {
        "+" => FixedOffset::east_opt(seconds),
        "-" => FixedOffset::west_opt(seconds),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precision_is_preserved() {
        assert_eq!(normalize_timestamp("2014").as_deref(), Some("2014"));
        assert_eq!(normalize_timestamp("201403").as_deref(), Some("2014-03"));
        assert_eq!(
            normalize_timestamp("20140302").as_deref(),
            Some("2014-03-02")
        );
    }

    #[test]
    fn full_timestamp_with_offset() {
        assert_eq!(
            normalize_timestamp("20140302101500-0500").as_deref(),
            Some("2014-03-02T10:15:00-05:00")
        );
        assert_eq!(
            normalize_timestamp("201403021015+0100").as_deref(),
            Some("2014-03-02T10:15:00+01:00")
        );
    }

    #[test]
    fn time_without_offset_truncates_to_date() {
        assert_eq!(
            normalize_timestamp("20140302101500").as_deref(),
            Some("2014-03-02")
        );
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(normalize_timestamp("").is_none());
        assert!(normalize_timestamp("20141315").is_none());
        assert!(normalize_timestamp("notadate").is_none());
        assert!(normalize_timestamp("2014030").is_none());
    }
}
