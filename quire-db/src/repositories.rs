pub mod component_repository;
pub mod page_repository;
pub mod user_repository;

pub use component_repository::*;
pub use page_repository::*;
pub use user_repository::*;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};

/// Parse a timestamp written either by `datetime('now')` or by a bound `DateTime<Utc>`
pub(crate) fn parse_datetime(value: &str) -> Result<DateTime<Utc>> {
    if value.contains('T') {
        return Ok(DateTime::parse_from_rfc3339(value)
            .with_context(|| format!("Failed to parse '{}' as RFC3339", value))?
            .with_timezone(&Utc));
    }

    Ok(NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f")
        .with_context(|| format!("Failed to parse '{}' as SQLite datetime", value))?
        .and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_sqlite_format() {
        assert_eq!(
            parse_datetime("2025-03-01 12:30:00").unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 1, 12, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_rfc3339() {
        assert_eq!(
            parse_datetime("2025-03-01T12:30:00+00:00").unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 1, 12, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_garbage() {
        assert!(parse_datetime("yesterday").is_err());
    }
}
