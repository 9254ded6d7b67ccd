//! Shared query parameter types for API handlers.

use chrono::{DateTime, Days, NaiveDate, Utc};
use promptvault_core::diff::DiffGranularity;
use promptvault_core::types::Timestamp;
use serde::Deserialize;

use crate::error::AppError;

/// `?search=` on list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub search: Option<String>,
}

/// Filters for `GET /projects/{id}/prompts`.
///
/// `tag` is a tag name; dates are RFC 3339 timestamps or `YYYY-MM-DD`.
#[derive(Debug, Default, Deserialize)]
pub struct PromptListParams {
    pub tag: Option<String>,
    pub version: Option<String>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// `GET /projects/{id}/sdk/prompt?name=&version=&tag=`.
#[derive(Debug, Deserialize)]
pub struct SdkPromptParams {
    pub name: String,
    pub version: Option<String>,
    pub tag: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DiffParams {
    #[serde(default)]
    pub granularity: DiffGranularity,
}

/// Treat an empty query value the same as an absent one.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Parse a date filter bound.
///
/// A bare date covers the whole day: as a start bound it means midnight, as
/// an end bound the last instant before the next midnight.
pub fn parse_date_bound(raw: &str, end_of_day: bool) -> Result<Timestamp, AppError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("Invalid date '{raw}'")))?;
    let day = if end_of_day {
        date.checked_add_days(Days::new(1))
            .ok_or_else(|| AppError::BadRequest(format!("Invalid date '{raw}'")))?
    } else {
        date
    };
    let midnight = day.and_time(chrono::NaiveTime::MIN).and_utc();
    Ok(if end_of_day {
        midnight - chrono::Duration::microseconds(1)
    } else {
        midnight
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn bare_dates_cover_whole_day() {
        let start = parse_date_bound("2024-03-01", false).unwrap();
        let end = parse_date_bound("2024-03-01", true).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
        assert!(end > Utc.with_ymd_and_hms(2024, 3, 1, 23, 59, 59).unwrap());
        assert!(end < Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap());
    }

    #[test]
    fn rfc3339_kept_exact() {
        let ts = parse_date_bound("2024-03-01T10:00:00+02:00", true).unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap());
    }

    #[test]
    fn garbage_rejected() {
        assert!(parse_date_bound("yesterday", false).is_err());
    }
}
