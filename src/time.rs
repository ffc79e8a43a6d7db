//! DB에 저장하는 UTC 시각 문자열 ↔ `DateTime<Utc>` 변환

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::AppError;

/// SQLite의 `strftime('%Y-%m-%dT%H:%M:%fZ', 'now')`와 같은 형식
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, AppError> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| AppError::Internal(format!("Date parse error: {}", e)))
}
